//! Per-session failure accumulator.
//!
//! An append-only bounded ring of [`FailureRecord`]s, owned exclusively
//! by one session: created empty at session start, never shared across
//! sessions, consulted when building retry prompts so each fallback
//! model sees exactly which prior attempts failed and why.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sandbox::TestOutcome;

use crate::contracts::Solution;

/// Why an attempt did not produce an accepted solution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// Quality heuristic below the applicable threshold.
    LowQuality { score: f64, threshold: f64 },
    /// Candidate passed the quality gate but failed test execution.
    TestsFailed { failed: usize, total: usize },
    /// Endpoint unreachable, non-success status, or request timeout.
    Transport { message: String },
    /// Response body missing the expected structure.
    Parse { message: String },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LowQuality { score, threshold } => {
                write!(f, "quality {score:.2} below threshold {threshold:.2}")
            }
            Self::TestsFailed { failed, total } => {
                write!(f, "{failed}/{total} test cases failed")
            }
            Self::Transport { message } => write!(f, "transport failure: {message}"),
            Self::Parse { message } => write!(f, "unparsable response: {message}"),
        }
    }
}

/// One failed attempt, as fed back into later retry prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureRecord {
    /// Retry attempt index (0 = concurrent top tier).
    pub attempt: u32,
    /// Display name of the model that failed.
    pub model: String,
    pub reason: FailureReason,
    /// The rejected solution, when one was parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<Solution>,
    /// Per-case outcomes, when the failure happened at the test gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_outcomes: Option<Vec<TestOutcome>>,
    pub timestamp: DateTime<Utc>,
}

impl FailureRecord {
    pub fn new(attempt: u32, model: impl Into<String>, reason: FailureReason) -> Self {
        Self {
            attempt,
            model: model.into(),
            reason,
            solution: None,
            test_outcomes: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_solution(mut self, solution: Solution) -> Self {
        self.solution = Some(solution);
        self
    }

    pub fn with_test_outcomes(mut self, outcomes: Vec<TestOutcome>) -> Self {
        self.test_outcomes = Some(outcomes);
        self
    }
}

/// Bounded ring of failure records.
///
/// Within a session the log only grows (up to capacity, evicting the
/// oldest); it is dropped with the session and never reused.
#[derive(Debug)]
pub struct FailureLog {
    records: VecDeque<FailureRecord>,
    capacity: usize,
}

impl FailureLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append a record, evicting the oldest once at capacity.
    pub fn push(&mut self, record: FailureRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in append order (oldest first).
    pub fn records(&self) -> impl Iterator<Item = &FailureRecord> {
        self.records.iter()
    }

    /// Snapshot for the session outcome.
    pub fn to_vec(&self) -> Vec<FailureRecord> {
        self.records.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(attempt: u32) -> FailureRecord {
        FailureRecord::new(
            attempt,
            format!("model-{attempt}"),
            FailureReason::LowQuality {
                score: 0.4,
                threshold: 0.7,
            },
        )
    }

    #[test]
    fn preserves_append_order() {
        let mut log = FailureLog::new(8);
        for i in 0..3 {
            log.push(record(i));
        }
        let attempts: Vec<u32> = log.records().map(|r| r.attempt).collect();
        assert_eq!(attempts, vec![0, 1, 2]);
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut log = FailureLog::new(2);
        for i in 0..5 {
            log.push(record(i));
        }
        assert_eq!(log.len(), 2);
        let attempts: Vec<u32> = log.records().map(|r| r.attempt).collect();
        assert_eq!(attempts, vec![3, 4]);
    }

    #[test]
    fn zero_capacity_clamped() {
        let mut log = FailureLog::new(0);
        log.push(record(0));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn reason_display_is_prompt_friendly() {
        let reason = FailureReason::TestsFailed {
            failed: 2,
            total: 5,
        };
        assert_eq!(reason.to_string(), "2/5 test cases failed");

        let reason = FailureReason::LowQuality {
            score: 0.45,
            threshold: 0.8,
        };
        assert!(reason.to_string().contains("0.45"));
    }

    #[test]
    fn record_serde_round_trip() {
        let rec = record(3).with_solution(Solution {
            code: "def f(): pass".into(),
            ..Default::default()
        });
        let json = serde_json::to_string(&rec).unwrap();
        let restored: FailureRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.attempt, 3);
        assert!(restored.solution.is_some());
    }
}
