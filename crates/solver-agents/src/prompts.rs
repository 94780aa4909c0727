//! Prompt templates for the solve and retry paths.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever template content
//! changes, so a logged response can be traced to the prompt text that
//! produced it.

use sandbox::Language;

use crate::failure_context::FailureRecord;

/// Prompt version. Bump on any template content change.
pub const PROMPT_VERSION: &str = "1.2.0";

/// Shared preamble: role, requirements, and the response format every
/// backend is asked to follow. The parser accepts either this labeled
/// layout or an equivalent JSON object.
const SOLVE_PREAMBLE: &str = "\
You are an expert algorithms and data structures problem solver.

REQUIREMENTS:
1. Provide a complete, working solution in the target language
2. Include time and space complexity analysis
3. Explain your approach and algorithm
4. Provide test cases to validate your solution
5. Ensure the code handles edge cases

FORMAT YOUR RESPONSE AS:
SOLUTION:
[Your complete code solution]

TIME_COMPLEXITY:
[Analysis]

SPACE_COMPLEXITY:
[Analysis]

APPROACH:
[Explanation of your algorithm]

TEST_CASES:
[Input: / Output: pairs]

EXPLANATION:
[Detailed explanation of your solution]";

/// Prompt for a first-attempt (concurrent top-tier) call.
pub fn build_solve_prompt(statement: &str, language: Language) -> String {
    format!(
        "{SOLVE_PREAMBLE}\n\nTARGET LANGUAGE: {language}\n\nPROBLEM:\n{statement}\n"
    )
}

/// Prompt for a fallback call, enriched with every recorded failure so
/// the retry model is steered away from repeated mistakes.
pub fn build_retry_prompt<'a>(
    statement: &str,
    language: Language,
    failures: impl Iterator<Item = &'a FailureRecord>,
) -> String {
    let mut prompt = build_solve_prompt(statement, language);

    let rendered: Vec<String> = failures.map(render_failure).collect();
    if !rendered.is_empty() {
        prompt.push_str("\nPREVIOUS ATTEMPTS THAT FAILED:\n");
        for line in &rendered {
            prompt.push_str(line);
            prompt.push('\n');
        }
        prompt.push_str(
            "\nAnalyze why these attempts failed and produce a different, correct solution. \
             Do not repeat the mistakes above.\n",
        );
    }

    prompt
}

fn render_failure(record: &FailureRecord) -> String {
    let mut line = format!(
        "- Attempt {} ({}): {}",
        record.attempt, record.model, record.reason
    );

    if let Some(outcomes) = &record.test_outcomes {
        for outcome in outcomes.iter().filter(|o| !o.passed) {
            let actual = outcome
                .actual_output
                .as_deref()
                .map(str::trim)
                .unwrap_or("<no output>");
            line.push_str(&format!(
                "\n    input {:?}: expected {:?}, got {:?}",
                outcome.test_case.input,
                outcome.test_case.expected_output.trim(),
                actual
            ));
        }
    }

    line
}
