//! Typed contracts between the session controller, the model clients,
//! and the caller.
//!
//! ```text
//! ProblemRequest  ──►  Session  ──►  SessionOutcome
//!                        │
//!                        ├─ AnalysisResult (one per model call)
//!                        │    └─ Solution (owned until accepted)
//!                        └─ TestOutcome (one per case per attempt)
//! ```
//!
//! An `AnalysisResult` is fail-closed: transport and parse failures
//! produce a zero-quality result with `error` set instead of escaping
//! the model-client boundary.

use serde::{Deserialize, Serialize};

use sandbox::{Language, TestCase, TestOutcome};

use crate::errors::SolverError;
use crate::failure_context::FailureRecord;

/// A problem to solve. Immutable once a session starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemRequest {
    pub statement: String,
    pub language: Language,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

impl ProblemRequest {
    pub fn new(statement: impl Into<String>, language: Language) -> Self {
        Self {
            statement: statement.into(),
            language,
            test_cases: Vec::new(),
        }
    }

    pub fn with_test_cases(mut self, test_cases: Vec<TestCase>) -> Self {
        self.test_cases = test_cases;
        self
    }

    /// Fail fast on statements the models cannot do anything with.
    /// Runs before any endpoint is contacted.
    pub fn validate(&self, min_statement_len: usize) -> Result<(), SolverError> {
        let trimmed = self.statement.trim();
        if trimmed.is_empty() {
            return Err(SolverError::Validation(
                "problem statement is empty".into(),
            ));
        }
        if trimmed.len() < min_statement_len {
            return Err(SolverError::Validation(format!(
                "problem statement too short: {} chars (minimum {})",
                trimmed.len(),
                min_statement_len
            )));
        }
        Ok(())
    }
}

/// A structured solution extracted from one model response.
///
/// Absent sections stay `None` — a sparse response is a low-quality
/// solution, not a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_complexity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_complexity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approach: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Test cases the model proposed for its own solution.
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

/// How a model call failed, when it did.
///
/// Kept structured (rather than a message string) so failure records
/// can classify without string matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisError {
    Transport { message: String },
    Parse { message: String },
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport { message } => write!(f, "transport failure: {message}"),
            Self::Parse { message } => write!(f, "unparsable response: {message}"),
        }
    }
}

/// Result of one model call: raw response, parsed solution (if any),
/// and the attached quality score. Produced once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Display name of the model that produced this result.
    pub source_model: String,
    pub raw_response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<Solution>,
    /// Heuristic completeness score in [0, 1]. Zero for failed calls.
    pub quality: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<AnalysisError>,
}

impl AnalysisResult {
    /// Fail-closed result for a transport or parse failure: quality 0,
    /// no solution, error recorded.
    pub fn from_failure(source_model: impl Into<String>, error: &SolverError) -> Self {
        let error = match error {
            SolverError::Parse { message, .. } => AnalysisError::Parse {
                message: message.clone(),
            },
            other => AnalysisError::Transport {
                message: other.to_string(),
            },
        };
        Self {
            source_model: source_model.into(),
            raw_response: String::new(),
            solution: None,
            quality: 0.0,
            error: Some(error),
        }
    }

    /// Whether this result carries a candidate worth evaluating.
    pub fn is_usable(&self) -> bool {
        self.error.is_none() && self.solution.is_some()
    }
}

/// Terminal result of a session, in the caller-facing wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<Solution>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_outcomes: Option<Vec<TestOutcome>>,
    /// Model that produced the accepted solution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Retry attempt that succeeded (0 = concurrent top tier).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failure_records: Vec<FailureRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SessionOutcome {
    /// Accepted solution with its evidence.
    pub fn succeeded(
        solution: Solution,
        test_outcomes: Option<Vec<TestOutcome>>,
        model: String,
        attempt: u32,
        failure_records: Vec<FailureRecord>,
    ) -> Self {
        Self {
            success: true,
            solution: Some(solution),
            test_outcomes,
            model: Some(model),
            attempt: Some(attempt),
            failure_records,
            error: None,
        }
    }

    /// Structured failure carrying the complete failure trail.
    pub fn exhausted(error: &SolverError, failure_records: Vec<FailureRecord>) -> Self {
        Self {
            success: false,
            solution: None,
            test_outcomes: None,
            model: None,
            attempt: None,
            failure_records,
            error: Some(error.to_string()),
        }
    }
}

/// Point-in-time snapshot of a running session, for status reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub session_id: String,
    pub attempt_count: u32,
    pub max_attempts: u32,
    pub failure_count: usize,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_statement_rejected() {
        let req = ProblemRequest::new("   ", Language::Python);
        assert!(req.validate(10).is_err());
    }

    #[test]
    fn short_statement_rejected_with_lengths() {
        let req = ProblemRequest::new("abcde", Language::Python);
        let err = req.validate(10).unwrap_err();
        assert!(err.to_string().contains("5 chars"));
    }

    #[test]
    fn adequate_statement_accepted() {
        let req = ProblemRequest::new("Sum all integers in the array.", Language::Python);
        assert!(req.validate(10).is_ok());
    }

    #[test]
    fn failure_result_is_zero_quality() {
        let err = crate::errors::SolverError::transport("Grok4", "connection refused");
        let result = AnalysisResult::from_failure("Grok4", &err);
        assert_eq!(result.quality, 0.0);
        assert!(!result.is_usable());
        assert!(result
            .error
            .unwrap()
            .to_string()
            .contains("connection refused"));
    }

    #[test]
    fn parse_failure_classified_structurally() {
        let err = crate::errors::SolverError::Parse {
            endpoint: "Grok4".into(),
            message: "no labeled sections".into(),
        };
        let result = AnalysisResult::from_failure("Grok4", &err);
        assert!(matches!(result.error, Some(AnalysisError::Parse { .. })));
    }

    #[test]
    fn outcome_wire_shape_is_camel_case() {
        let outcome = SessionOutcome::succeeded(
            Solution {
                code: "def f(): pass".into(),
                ..Default::default()
            },
            None,
            "Claude 3.5".into(),
            0,
            Vec::new(),
        );
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"attempt\":0"));
        assert!(!json.contains("failure_records"));
    }

    #[test]
    fn request_round_trips_inbound_shape() {
        let json = r#"{
            "statement": "Given an array, return the sum.",
            "language": "python",
            "testCases": [{"input": "[1,2,3]", "expectedOutput": "6"}]
        }"#;
        let req: ProblemRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.language, Language::Python);
        assert_eq!(req.test_cases.len(), 1);
        assert_eq!(req.test_cases[0].expected_output, "6");
    }
}
