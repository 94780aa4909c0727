//! Quality scoring — a completeness heuristic, not a correctness proof.
//!
//! Additive over five recognized sections, clamped to 1.0. Correctness
//! is established separately by test execution; this score only decides
//! whether a response is well-formed enough to be worth testing.

use crate::config::QualityWeights;
use crate::contracts::Solution;

/// Score a parsed solution in [0, 1] under the given weights.
///
/// Adding any one recognized section to an otherwise-identical solution
/// never decreases the score (each term is independently non-negative).
pub fn score(solution: &Solution, weights: &QualityWeights) -> f64 {
    let mut total = 0.0;

    if solution.code.trim().len() > weights.min_code_len {
        total += weights.code;
    }

    if has_text(&solution.time_complexity) && has_text(&solution.space_complexity) {
        total += weights.complexity;
    }

    if section_longer_than(&solution.approach, weights.min_approach_len) {
        total += weights.approach;
    }

    if !solution.test_cases.is_empty() {
        total += weights.test_cases;
    }

    if section_longer_than(&solution.explanation, weights.min_explanation_len) {
        total += weights.explanation;
    }

    total.min(1.0)
}

fn has_text(section: &Option<String>) -> bool {
    section.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn section_longer_than(section: &Option<String>, min_len: usize) -> bool {
    section.as_deref().is_some_and(|s| s.trim().len() > min_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sandbox::TestCase;

    fn full_solution() -> Solution {
        Solution {
            code: "def total(nums):\n    return sum(nums)".into(),
            time_complexity: Some("O(n)".into()),
            space_complexity: Some("O(1)".into()),
            approach: Some("Single pass accumulating the running sum.".into()),
            explanation: Some(
                "Iterate once over the input, adding each element to an accumulator; \
                 no extra storage is needed beyond the accumulator itself."
                    .into(),
            ),
            test_cases: vec![TestCase::new("[1,2,3]", "6")],
        }
    }

    #[test]
    fn complete_solution_scores_one() {
        let s = score(&full_solution(), &QualityWeights::default());
        assert!((s - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_solution_scores_zero() {
        let s = score(&Solution::default(), &QualityWeights::default());
        assert_eq!(s, 0.0);
    }

    #[test]
    fn trivial_code_scores_nothing() {
        let solution = Solution {
            code: "x = 1".into(),
            ..Default::default()
        };
        assert_eq!(score(&solution, &QualityWeights::default()), 0.0);
    }

    #[test]
    fn one_sided_complexity_does_not_count() {
        let mut solution = full_solution();
        solution.space_complexity = None;
        let s = score(&solution, &QualityWeights::default());
        assert!((s - 0.8).abs() < 1e-9);
    }

    #[test]
    fn score_is_monotonic_in_each_section() {
        let weights = QualityWeights::default();
        let base = Solution {
            code: "def total(nums):\n    return sum(nums)".into(),
            ..Default::default()
        };
        let base_score = score(&base, &weights);

        let additions: Vec<Box<dyn Fn(&mut Solution)>> = vec![
            Box::new(|s| {
                s.time_complexity = Some("O(n)".into());
                s.space_complexity = Some("O(1)".into());
            }),
            Box::new(|s| s.approach = Some("Single pass accumulating the running sum.".into())),
            Box::new(|s| s.test_cases.push(TestCase::new("[1]", "1"))),
            Box::new(|s| {
                s.explanation = Some(
                    "Walk the array once and accumulate; constant memory and linear time overall."
                        .into(),
                )
            }),
        ];

        for add in additions {
            let mut enriched = base.clone();
            add(&mut enriched);
            assert!(
                score(&enriched, &weights) >= base_score,
                "adding a section must never decrease the score"
            );
        }
    }

    #[test]
    fn score_always_within_unit_interval() {
        // Weights that would sum past 1.0 must still clamp.
        let weights = QualityWeights {
            code: 0.9,
            complexity: 0.9,
            approach: 0.9,
            test_cases: 0.9,
            explanation: 0.9,
            ..Default::default()
        };
        let s = score(&full_solution(), &weights);
        assert!(s <= 1.0);
        assert!(s >= 0.0);
    }
}
