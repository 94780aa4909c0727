//! Multi-model orchestration for algorithmic problem solving.
//!
//! Given a natural-language problem statement, a target language, and
//! optional test cases, the solver:
//!
//! 1. Queries the two top-tier model backends concurrently.
//! 2. Scores each response with a completeness heuristic.
//! 3. Runs the best candidate against the test cases in the sandboxed
//!    execution engine (quality gate first, then test gate).
//! 4. On failure, walks the ranked retry list sequentially, feeding the
//!    accumulated failure context into each fallback prompt.
//!
//! The caller always receives either an accepted solution with full
//! test evidence or a structured failure with the complete failure
//! trail — never a bare exception.
//!
//! # Usage
//!
//! ```rust,ignore
//! use solver_agents::{ProblemRequest, Solver, SolverConfig};
//! use sandbox::{Language, TestCase};
//!
//! let solver = Solver::new(SolverConfig::default())?;
//! let request = ProblemRequest::new("Given an array of integers, return their sum.", Language::Python)
//!     .with_test_cases(vec![TestCase::new("[1,2,3]", "6")]);
//! let outcome = solver.solve(request).await?;
//! ```

pub mod client;
pub mod config;
pub mod contracts;
pub mod errors;
pub mod failure_context;
pub mod prompts;
pub mod response;
pub mod scoring;
pub mod session;
pub mod state_machine;

pub use client::{check_endpoint, AnalysisBackend, HealthReport, ModelClient};
pub use config::{ModelEndpoint, QualityWeights, RankClass, SamplingOptions, SolverConfig};
pub use contracts::{
    AnalysisError, AnalysisResult, ProblemRequest, SessionOutcome, SessionStatus, Solution,
};
pub use errors::SolverError;
pub use failure_context::{FailureLog, FailureReason, FailureRecord};
pub use response::{parse_response, ParsedResponse, ResponseVariant};
pub use session::{Session, SolutionExecutor, Solver};
pub use state_machine::{SessionState, StateMachine, TransitionRecord};
