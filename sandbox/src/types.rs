//! Core types shared by the execution engine and its callers.
//!
//! A [`TestCase`] pairs an input with its expected output; running one
//! produces a [`TestOutcome`]. Outcomes never panic their way out of the
//! engine — every failure mode (compile, runtime, timeout, spawn) is
//! captured in [`ExecutionError`] and recorded on the outcome.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Languages the execution engine can prepare and run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Javascript,
    Java,
    Cpp,
}

impl Language {
    /// All supported languages, in a stable order.
    pub fn all() -> &'static [Language] {
        &[Self::Python, Self::Javascript, Self::Java, Self::Cpp]
    }

    /// Whether this language needs a compile step before execution.
    pub fn is_compiled(self) -> bool {
        matches!(self, Self::Java | Self::Cpp)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Python => write!(f, "python"),
            Self::Javascript => write!(f, "javascript"),
            Self::Java => write!(f, "java"),
            Self::Cpp => write!(f, "cpp"),
        }
    }
}

/// Error for an unrecognized language tag.
#[derive(Debug, Clone, Error)]
#[error("unsupported language: {0}")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Self::Python),
            "javascript" | "js" | "node" => Ok(Self::Javascript),
            "java" => Ok(Self::Java),
            "cpp" | "c++" => Ok(Self::Cpp),
            other => Err(UnsupportedLanguage(other.to_string())),
        }
    }
}

/// One input/expected-output pair.
///
/// Order within a suite matters for reporting, not for correctness —
/// cases are executed independently and sequentially.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input: String,
    pub expected_output: String,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
        }
    }
}

/// Failure modes of a single sandboxed execution.
///
/// None of these abort the remaining cases in a suite — each case gets
/// its own process, artifacts, and timeout budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionError {
    /// The compile sub-step exited non-zero (compiled languages only).
    /// Execution is never attempted after this.
    #[error("compilation failed: {message}")]
    Compilation { message: String },

    /// The program started but exited non-zero.
    #[error("runtime error: {message}")]
    Runtime { message: String },

    /// The process exceeded the wall-clock budget and was killed.
    #[error("execution timed out after {limit_secs}s")]
    Timeout { limit_secs: u64 },

    /// The toolchain binary could not be spawned at all
    /// (interpreter/compiler missing from the host).
    #[error("failed to launch {program}: {message}")]
    Spawn { program: String, message: String },

    /// Could not materialize the execution artifact on disk.
    #[error("failed to stage artifacts: {message}")]
    Staging { message: String },
}

impl ExecutionError {
    /// Whether this outcome came from the compile sub-step.
    pub fn is_compilation(&self) -> bool {
        matches!(self, Self::Compilation { .. })
    }

    /// Whether the process was forcibly terminated on timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Result of running one test case against one solution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOutcome {
    pub test_case: TestCase,
    /// Raw captured stdout, present when the process ran to completion.
    pub actual_output: Option<String>,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ExecutionError>,
    /// Wall-clock duration of the execution (including compile), in ms.
    pub duration_ms: u64,
}

impl TestOutcome {
    /// Outcome for a case that never produced output.
    pub fn failed(test_case: TestCase, error: ExecutionError, duration_ms: u64) -> Self {
        Self {
            test_case,
            actual_output: None,
            passed: false,
            error: Some(error),
            duration_ms,
        }
    }
}

/// Aggregated result of running a full test-case sequence.
///
/// `outcomes` preserves the order of the supplied cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteReport {
    pub all_passed: bool,
    pub outcomes: Vec<TestOutcome>,
    pub total: usize,
    pub passed: usize,
}

impl SuiteReport {
    /// Build a report from per-case outcomes.
    pub fn from_outcomes(outcomes: Vec<TestOutcome>) -> Self {
        let total = outcomes.len();
        let passed = outcomes.iter().filter(|o| o.passed).count();
        Self {
            all_passed: passed == total,
            outcomes,
            total,
            passed,
        }
    }

    /// Report for an empty suite — vacuously green.
    pub fn empty() -> Self {
        Self::from_outcomes(Vec::new())
    }

    /// Compact text summary for logs and retry prompts.
    ///
    /// Example: `[FAIL] 2/4 cases passed | first_fail=#1 (runtime error: ...)`
    pub fn compact_text(&self) -> String {
        let status = if self.all_passed { "PASS" } else { "FAIL" };
        let mut out = format!("[{}] {}/{} cases passed", status, self.passed, self.total);
        if let Some((idx, first)) = self
            .outcomes
            .iter()
            .enumerate()
            .find(|(_, o)| !o.passed)
        {
            let why = match (&first.error, &first.actual_output) {
                (Some(e), _) => e.to_string(),
                (None, Some(actual)) => format!(
                    "expected {:?}, got {:?}",
                    first.test_case.expected_output.trim(),
                    actual.trim()
                ),
                (None, None) => "no output".to_string(),
            };
            out.push_str(&format!(" | first_fail=#{idx} ({why})"));
        }
        out
    }
}
