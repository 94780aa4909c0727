//! Session state machine — explicit states and legal transition guards.
//!
//! The session controller calls `advance()` to move between states. Each
//! call validates that the edge exists in the transition table and
//! records it, so a finished session carries a complete, auditable
//! trace of how it reached its terminal state.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// The set of session states.
///
/// Every session starts at `Init` and terminates at either `Success`
/// or `Exhausted`. A request that fails validation never enters the
/// state machine at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Request received and validated.
    Init,
    /// Both top-tier model calls in flight, joining on completion.
    ConcurrentAnalysis,
    /// Scoring the two candidates and picking the better one.
    Evaluation,
    /// A candidate met the quality threshold.
    Accepted,
    /// Running the accepted candidate against the supplied test cases.
    TestExecution,
    /// Walking the ranked fallback list, one sequential call at a time.
    Retrying,
    /// Accepted solution with full test evidence — terminal.
    Success,
    /// Retry list or attempt budget consumed — terminal.
    Exhausted,
}

impl SessionState {
    /// Whether this is a terminal state (no further transitions allowed).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Exhausted)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "Init"),
            Self::ConcurrentAnalysis => write!(f, "ConcurrentAnalysis"),
            Self::Evaluation => write!(f, "Evaluation"),
            Self::Accepted => write!(f, "Accepted"),
            Self::TestExecution => write!(f, "TestExecution"),
            Self::Retrying => write!(f, "Retrying"),
            Self::Success => write!(f, "Success"),
            Self::Exhausted => write!(f, "Exhausted"),
        }
    }
}

/// Legal transitions between session states.
///
/// ```text
/// Init → ConcurrentAnalysis
/// ConcurrentAnalysis → Evaluation
/// Evaluation → Accepted | Retrying
/// Accepted → TestExecution | Success
/// TestExecution → Success | Retrying
/// Retrying → Accepted | Retrying | Exhausted
/// ```
///
/// `Retrying → Retrying` is the next-candidate self-loop; `Retrying →
/// Accepted` routes a good fallback candidate through the same test
/// gate as the concurrent path.
fn is_legal_transition(from: SessionState, to: SessionState) -> bool {
    use SessionState::*;

    matches!(
        (from, to),
        (Init, ConcurrentAnalysis)
            | (ConcurrentAnalysis, Evaluation)
            | (Evaluation, Accepted)
            | (Evaluation, Retrying)
            | (Accepted, TestExecution)
            | (Accepted, Success)
            | (TestExecution, Success)
            | (TestExecution, Retrying)
            | (Retrying, Accepted)
            | (Retrying, Retrying)
            | (Retrying, Exhausted)
    )
}

/// A single recorded state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: SessionState,
    pub to: SessionState,
    /// Retry-attempt number at the time of transition (0 before the
    /// fallback phase starts).
    pub attempt: u32,
    /// Milliseconds since the state machine was created.
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Error returned when an illegal transition is attempted.
#[derive(Debug, Clone)]
pub struct IllegalTransition {
    pub from: SessionState,
    pub to: SessionState,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Illegal state transition: {} → {}", self.from, self.to)
    }
}

impl std::error::Error for IllegalTransition {}

/// The session state machine.
pub struct StateMachine {
    current: SessionState,
    attempt: u32,
    created_at: Instant,
    transitions: Vec<TransitionRecord>,
}

impl StateMachine {
    /// Create a new state machine starting at `Init`.
    pub fn new() -> Self {
        Self {
            current: SessionState::Init,
            attempt: 0,
            created_at: Instant::now(),
            transitions: Vec::new(),
        }
    }

    pub fn current(&self) -> SessionState {
        self.current
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Set the retry-attempt counter (called by the session controller).
    pub fn set_attempt(&mut self, attempt: u32) {
        self.attempt = attempt;
    }

    /// Attempt to advance to the next state.
    pub fn advance(
        &mut self,
        to: SessionState,
        reason: Option<&str>,
    ) -> Result<(), IllegalTransition> {
        if !is_legal_transition(self.current, to) {
            return Err(IllegalTransition {
                from: self.current,
                to,
            });
        }

        let record = TransitionRecord {
            from: self.current,
            to,
            attempt: self.attempt,
            elapsed_ms: self.created_at.elapsed().as_millis() as u64,
            reason: reason.map(String::from),
        };

        tracing::debug!(
            from = %self.current,
            to = %to,
            attempt = self.attempt,
            "State transition"
        );

        self.transitions.push(record);
        self.current = to;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    /// Get the full transition log.
    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    /// Compact history string for logs.
    pub fn summary(&self) -> String {
        let states: Vec<String> = self.transitions.iter().map(|t| t.to.to_string()).collect();
        format!(
            "{} → {} ({}ms, {} transitions)",
            SessionState::Init,
            self.current,
            self.created_at.elapsed().as_millis(),
            self.transitions.len(),
        ) + if states.is_empty() {
            String::new()
        } else {
            format!(" [{}]", states.join(" → "))
        }
        .as_str()
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state() {
        let sm = StateMachine::new();
        assert_eq!(sm.current(), SessionState::Init);
        assert!(!sm.is_terminal());
        assert_eq!(sm.transitions().len(), 0);
    }

    #[test]
    fn happy_path_without_tests() {
        let mut sm = StateMachine::new();

        sm.advance(SessionState::ConcurrentAnalysis, None).unwrap();
        sm.advance(SessionState::Evaluation, None).unwrap();
        sm.advance(SessionState::Accepted, Some("primary 0.9 >= 0.8"))
            .unwrap();
        sm.advance(SessionState::Success, Some("no test cases supplied"))
            .unwrap();

        assert!(sm.is_terminal());
        assert_eq!(sm.current(), SessionState::Success);
        assert_eq!(sm.transitions().len(), 4);
    }

    #[test]
    fn happy_path_through_test_execution() {
        let mut sm = StateMachine::new();

        sm.advance(SessionState::ConcurrentAnalysis, None).unwrap();
        sm.advance(SessionState::Evaluation, None).unwrap();
        sm.advance(SessionState::Accepted, None).unwrap();
        sm.advance(SessionState::TestExecution, None).unwrap();
        sm.advance(SessionState::Success, Some("3/3 cases passed"))
            .unwrap();

        assert!(sm.is_terminal());
    }

    #[test]
    fn retry_loop_to_success() {
        let mut sm = StateMachine::new();

        sm.advance(SessionState::ConcurrentAnalysis, None).unwrap();
        sm.advance(SessionState::Evaluation, None).unwrap();
        sm.advance(SessionState::Retrying, Some("best 0.5 below threshold"))
            .unwrap();
        sm.set_attempt(1);
        // First fallback also below threshold — next candidate.
        sm.advance(SessionState::Retrying, Some("0.6 below threshold"))
            .unwrap();
        sm.set_attempt(2);
        sm.advance(SessionState::Accepted, None).unwrap();
        sm.advance(SessionState::TestExecution, None).unwrap();
        sm.advance(SessionState::Success, None).unwrap();

        assert!(sm.is_terminal());
        assert_eq!(sm.transitions().last().unwrap().attempt, 2);
    }

    #[test]
    fn failed_tests_route_back_to_retrying() {
        let mut sm = StateMachine::new();

        sm.advance(SessionState::ConcurrentAnalysis, None).unwrap();
        sm.advance(SessionState::Evaluation, None).unwrap();
        sm.advance(SessionState::Accepted, None).unwrap();
        sm.advance(SessionState::TestExecution, None).unwrap();
        sm.advance(SessionState::Retrying, Some("1/3 cases failed"))
            .unwrap();
        sm.advance(SessionState::Exhausted, Some("retry list empty"))
            .unwrap();

        assert_eq!(sm.current(), SessionState::Exhausted);
        assert!(sm.is_terminal());
    }

    #[test]
    fn cannot_transition_from_terminal() {
        let mut sm = StateMachine::new();
        sm.advance(SessionState::ConcurrentAnalysis, None).unwrap();
        sm.advance(SessionState::Evaluation, None).unwrap();
        sm.advance(SessionState::Accepted, None).unwrap();
        sm.advance(SessionState::Success, None).unwrap();

        let err = sm.advance(SessionState::Retrying, None).unwrap_err();
        assert_eq!(err.from, SessionState::Success);
        assert_eq!(err.to, SessionState::Retrying);
    }

    #[test]
    fn cannot_skip_evaluation() {
        let mut sm = StateMachine::new();
        sm.advance(SessionState::ConcurrentAnalysis, None).unwrap();

        let err = sm.advance(SessionState::Accepted, None).unwrap_err();
        assert_eq!(err.from, SessionState::ConcurrentAnalysis);
    }

    #[test]
    fn exhausted_only_reachable_from_retrying() {
        let mut sm = StateMachine::new();
        sm.advance(SessionState::ConcurrentAnalysis, None).unwrap();
        assert!(sm.advance(SessionState::Exhausted, None).is_err());
    }

    #[test]
    fn transition_record_serde_round_trip() {
        let record = TransitionRecord {
            from: SessionState::TestExecution,
            to: SessionState::Retrying,
            attempt: 2,
            elapsed_ms: 4321,
            reason: Some("2/3 cases failed".into()),
        };

        let json = serde_json::to_string(&record).unwrap();
        let restored: TransitionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.from, SessionState::TestExecution);
        assert_eq!(restored.to, SessionState::Retrying);
        assert_eq!(restored.attempt, 2);
    }

    #[test]
    fn summary_mentions_terminal_state() {
        let mut sm = StateMachine::new();
        sm.advance(SessionState::ConcurrentAnalysis, None).unwrap();
        sm.advance(SessionState::Evaluation, None).unwrap();
        sm.advance(SessionState::Retrying, None).unwrap();
        sm.advance(SessionState::Exhausted, None).unwrap();

        let summary = sm.summary();
        assert!(summary.contains("Exhausted"));
        assert!(summary.contains("4 transitions"));
    }
}
