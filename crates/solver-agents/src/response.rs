//! Model-response parsing.
//!
//! Backends answer in one of two shapes: a single JSON object, or free
//! text with labeled sections (`SOLUTION:`, `TIME_COMPLEXITY:`, ...).
//! The variant is resolved exactly once per response and tagged on the
//! result, so scoring and the session controller never re-inspect the
//! raw text. Absent sections leave the corresponding solution fields
//! empty; only a response with no extractable code at all is a parse
//! failure.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use sandbox::TestCase;

use crate::contracts::Solution;

/// Which of the two accepted response shapes was recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseVariant {
    /// Single JSON object with solution/complexity/approach keys.
    Structured,
    /// Labeled plain-text sections.
    FreeText,
}

impl std::fmt::Display for ResponseVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structured => write!(f, "structured"),
            Self::FreeText => write!(f, "free_text"),
        }
    }
}

/// A response resolved into one variant with its extracted solution.
#[derive(Debug, Clone)]
pub struct ParsedResponse {
    pub variant: ResponseVariant,
    pub solution: Solution,
}

/// The response matched neither accepted shape.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ResponseParseError(String);

/// Section labels recognized in free-text responses.
const SECTION_LABELS: &[&str] = &[
    "SOLUTION",
    "TIME_COMPLEXITY",
    "SPACE_COMPLEXITY",
    "APPROACH",
    "TEST_CASES",
    "EXPLANATION",
];

/// Parse a raw response body, trying JSON first, then labeled sections.
pub fn parse_response(raw: &str) -> Result<ParsedResponse, ResponseParseError> {
    if let Some(solution) = parse_structured(raw) {
        return Ok(ParsedResponse {
            variant: ResponseVariant::Structured,
            solution,
        });
    }

    if let Some(solution) = parse_free_text(raw) {
        return Ok(ParsedResponse {
            variant: ResponseVariant::FreeText,
            solution,
        });
    }

    Err(ResponseParseError(
        "response is neither a JSON solution object nor labeled sections".into(),
    ))
}

/// Wire shape of a structured (JSON) response. Accepts both the flat
/// form and the nested `problem_analysis` form.
#[derive(Debug, Deserialize)]
struct StructuredBody {
    #[serde(alias = "code")]
    solution: Option<String>,
    time_complexity: Option<String>,
    space_complexity: Option<String>,
    approach: Option<String>,
    explanation: Option<String>,
    #[serde(default)]
    pseudocode: Option<String>,
    problem_analysis: Option<ProblemAnalysis>,
    #[serde(default)]
    test_cases: Vec<StructuredTestCase>,
}

#[derive(Debug, Deserialize)]
struct ProblemAnalysis {
    approach: Option<String>,
    complexity: Option<ComplexityPair>,
}

#[derive(Debug, Deserialize)]
struct ComplexityPair {
    time: Option<String>,
    space: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StructuredTestCase {
    #[serde(default)]
    input: String,
    #[serde(default, alias = "expectedOutput")]
    expected_output: String,
}

fn parse_structured(raw: &str) -> Option<Solution> {
    let body: StructuredBody = serde_json::from_str(raw.trim()).ok()?;

    let code = strip_code_fence(body.solution.as_deref()?.trim()).to_string();
    if code.is_empty() {
        return None;
    }

    let analysis = body.problem_analysis.as_ref();
    let complexity = analysis.and_then(|a| a.complexity.as_ref());

    Some(Solution {
        code,
        time_complexity: body
            .time_complexity
            .or_else(|| complexity.and_then(|c| c.time.clone())),
        space_complexity: body
            .space_complexity
            .or_else(|| complexity.and_then(|c| c.space.clone())),
        approach: body
            .approach
            .or_else(|| analysis.and_then(|a| a.approach.clone())),
        explanation: body.explanation.or(body.pseudocode),
        test_cases: body
            .test_cases
            .into_iter()
            .filter(|tc| !tc.input.is_empty() || !tc.expected_output.is_empty())
            .map(|tc| TestCase::new(tc.input, tc.expected_output))
            .collect(),
    })
}

fn label_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*(SOLUTION|TIME_COMPLEXITY|SPACE_COMPLEXITY|APPROACH|TEST_CASES|EXPLANATION)\s*:")
            .expect("valid regex")
    })
}

fn fence_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```[\w+-]*\n?(.*?)```").expect("valid regex"))
}

fn parse_free_text(raw: &str) -> Option<Solution> {
    let sections = split_sections(raw);
    let code = strip_code_fence(sections_get(&sections, "SOLUTION")?).to_string();
    if code.trim().is_empty() {
        return None;
    }

    Some(Solution {
        code: code.trim().to_string(),
        time_complexity: owned(sections_get(&sections, "TIME_COMPLEXITY")),
        space_complexity: owned(sections_get(&sections, "SPACE_COMPLEXITY")),
        approach: owned(sections_get(&sections, "APPROACH")),
        explanation: owned(sections_get(&sections, "EXPLANATION")),
        test_cases: sections_get(&sections, "TEST_CASES")
            .map(parse_test_case_lines)
            .unwrap_or_default(),
    })
}

/// Slice the response into (label, body) pairs by locating every label
/// occurrence; each body runs until the next label or end of input.
fn split_sections(raw: &str) -> Vec<(&str, &str)> {
    let matches: Vec<_> = label_pattern().captures_iter(raw).collect();
    let mut sections = Vec::with_capacity(matches.len());

    for (idx, caps) in matches.iter().enumerate() {
        let label = caps.get(1).expect("group 1 always present");
        let body_start = caps.get(0).expect("whole match").end();
        let body_end = matches
            .get(idx + 1)
            .map(|next| next.get(0).expect("whole match").start())
            .unwrap_or(raw.len());
        sections.push((label.as_str(), raw[body_start..body_end].trim()));
    }

    debug_assert!(sections
        .iter()
        .all(|(label, _)| SECTION_LABELS.contains(label)));
    sections
}

fn sections_get<'a>(sections: &[(&str, &'a str)], label: &str) -> Option<&'a str> {
    sections
        .iter()
        .find(|(l, body)| *l == label && !body.is_empty())
        .map(|(_, body)| *body)
}

fn owned(section: Option<&str>) -> Option<String> {
    section.map(str::to_string)
}

/// Strip a surrounding markdown code fence, if present.
fn strip_code_fence(text: &str) -> &str {
    match fence_pattern().captures(text) {
        Some(caps) => caps.get(1).map(|m| m.as_str().trim()).unwrap_or(text),
        None => text,
    }
}

/// Parse `Input:` / `Output:` line pairs from a TEST_CASES section.
fn parse_test_case_lines(section: &str) -> Vec<TestCase> {
    let mut cases = Vec::new();
    let mut current: Option<TestCase> = None;

    for line in section.lines() {
        let trimmed = line.trim().trim_start_matches(['-', '*', ' ']);
        if let Some(value) = value_after_label(trimmed, "input") {
            if let Some(done) = current.take() {
                cases.push(done);
            }
            current = Some(TestCase::new(value, ""));
        } else if let Some(value) = value_after_label(trimmed, "output")
            .or_else(|| value_after_label(trimmed, "expected output"))
        {
            if let Some(case) = current.as_mut() {
                case.expected_output = value.to_string();
            }
        }
    }

    if let Some(done) = current {
        cases.push(done);
    }

    // A case without an expected output cannot be executed.
    cases.retain(|c| !c.expected_output.is_empty());
    cases
}

fn value_after_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let lower = line.to_ascii_lowercase();
    let prefix = format!("{label}:");
    if lower.starts_with(&prefix) {
        Some(line[prefix.len()..].trim())
    } else {
        None
    }
}
