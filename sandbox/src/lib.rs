//! Sandboxed multi-language test execution.
//!
//! This crate turns model-generated solution code plus a test case into
//! a verdict:
//!
//! 1. Prepare — inject a call to the detected entry point with the test
//!    case's input, keeping user-defined functions and classes unmodified.
//! 2. Stage — materialize the unit in a fresh temp directory (plus a
//!    compile sub-step for Java and C++).
//! 3. Execute — spawn an isolated process with a hard wall-clock timeout;
//!    on expiry the whole process group is killed.
//! 4. Compare — normalize stdout and the expected output (trim, collapse
//!    whitespace, JSON-aware equality) and record a [`TestOutcome`].
//! 5. Release — all artifacts are dropped on every exit path.
//!
//! The engine holds no cross-case state: each case in a suite runs
//! sequentially in its own directory and process, and multiple engines
//! (or sessions sharing one engine) never interfere.

pub mod languages;
pub mod output;
pub mod runner;
pub mod types;

pub use languages::{LanguageRuntime, PreparedUnit};
pub use runner::{Engine, ExecutionConfig};
pub use types::{
    ExecutionError, Language, SuiteReport, TestCase, TestOutcome, UnsupportedLanguage,
};
