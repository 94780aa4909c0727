//! The execution engine: stage, (compile,) run, compare, clean up.
//!
//! Every test case gets a fresh staging directory, a fresh process, and
//! its own wall-clock budget enforced with `tokio::time::timeout`. On
//! Unix the child is moved into its own process group and spawned with
//! `kill_on_drop(true)`, so a timeout kills the entire process tree —
//! nothing survives into the next case. The staging directory is a
//! `TempDir` guard, so source files, class files, and binaries are
//! released on every exit path, including timeout and compile failure.

use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::languages::{runtime_for, PreparedUnit};
use crate::output::outputs_match;
use crate::types::{ExecutionError, Language, SuiteReport, TestCase, TestOutcome};

/// Configuration for the execution engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Wall-clock budget per test-case execution (seconds).
    pub timeout_secs: u64,
    /// Wall-clock budget for the compile sub-step (seconds).
    pub compile_timeout_secs: u64,
    /// Truncate captured stderr to this many bytes.
    pub stderr_max_bytes: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            compile_timeout_secs: 30,
            stderr_max_bytes: 4096,
        }
    }
}

/// Sandboxed test-execution engine.
///
/// Stateless apart from its configuration: concurrent callers get
/// independent processes and staging directories, so one engine can be
/// shared across sessions.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: ExecutionConfig,
}

enum WaitError {
    Timeout,
    Spawn(std::io::Error),
}

impl Engine {
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Run every case in order, independently; one failing case never
    /// aborts the rest of the suite.
    pub async fn run_suite(
        &self,
        code: &str,
        cases: &[TestCase],
        language: Language,
    ) -> SuiteReport {
        let mut outcomes = Vec::with_capacity(cases.len());
        for (idx, case) in cases.iter().enumerate() {
            let outcome = self.run_case(code, case, language).await;
            debug!(
                case = idx,
                passed = outcome.passed,
                duration_ms = outcome.duration_ms,
                %language,
                "Test case executed"
            );
            outcomes.push(outcome);
        }
        SuiteReport::from_outcomes(outcomes)
    }

    /// Run one test case: prepare a self-contained unit, stage it in a
    /// fresh temp directory, compile if the language needs it, execute
    /// under the timeout, and compare normalized output.
    pub async fn run_case(&self, code: &str, case: &TestCase, language: Language) -> TestOutcome {
        let start = Instant::now();
        let runtime = runtime_for(language);
        let unit = runtime.prepare(code, case);

        let dir = match tempfile::Builder::new().prefix("sandbox-").tempdir() {
            Ok(dir) => dir,
            Err(e) => {
                return TestOutcome::failed(
                    case.clone(),
                    ExecutionError::Staging {
                        message: e.to_string(),
                    },
                    elapsed_ms(start),
                );
            }
        };

        if let Err(e) = tokio::fs::write(dir.path().join(&unit.file_name), &unit.source).await {
            return TestOutcome::failed(
                case.clone(),
                ExecutionError::Staging {
                    message: e.to_string(),
                },
                elapsed_ms(start),
            );
        }

        if let Some(error) = self.compile(dir.path(), runtime.language(), &unit).await {
            return TestOutcome::failed(case.clone(), error, elapsed_ms(start));
        }

        let mut cmd = runtime.run_command(dir.path(), &unit);
        let limit = Duration::from_secs(self.config.timeout_secs);
        let outcome = match self.wait_with_timeout(&mut cmd, limit).await {
            Ok(output) if output.status.success() => {
                let actual = String::from_utf8_lossy(&output.stdout).to_string();
                let passed = outputs_match(&actual, &case.expected_output);
                TestOutcome {
                    test_case: case.clone(),
                    actual_output: Some(actual),
                    passed,
                    error: None,
                    duration_ms: elapsed_ms(start),
                }
            }
            Ok(output) => {
                let stderr = self.truncate(&String::from_utf8_lossy(&output.stderr));
                TestOutcome::failed(
                    case.clone(),
                    ExecutionError::Runtime { message: stderr },
                    elapsed_ms(start),
                )
            }
            Err(WaitError::Timeout) => {
                warn!(
                    %language,
                    limit_secs = self.config.timeout_secs,
                    "Execution timed out, process tree killed"
                );
                TestOutcome::failed(
                    case.clone(),
                    ExecutionError::Timeout {
                        limit_secs: self.config.timeout_secs,
                    },
                    elapsed_ms(start),
                )
            }
            Err(WaitError::Spawn(e)) => TestOutcome::failed(
                case.clone(),
                ExecutionError::Spawn {
                    program: program_name(&cmd),
                    message: e.to_string(),
                },
                elapsed_ms(start),
            ),
        };

        // `dir` drops here, releasing source, class files, and binaries
        // no matter which arm produced the outcome.
        outcome
    }

    /// Run the compile sub-step, if the language has one.
    ///
    /// Returns `Some(error)` when compilation failed — execution must
    /// not be attempted afterwards.
    async fn compile(
        &self,
        dir: &std::path::Path,
        language: Language,
        unit: &PreparedUnit,
    ) -> Option<ExecutionError> {
        let mut cmd = runtime_for(language).compile_command(dir, unit)?;
        let limit = Duration::from_secs(self.config.compile_timeout_secs);
        match self.wait_with_timeout(&mut cmd, limit).await {
            Ok(output) if output.status.success() => None,
            Ok(output) => Some(ExecutionError::Compilation {
                message: self.truncate(&String::from_utf8_lossy(&output.stderr)),
            }),
            Err(WaitError::Timeout) => Some(ExecutionError::Compilation {
                message: format!(
                    "compiler exceeded {}s budget",
                    self.config.compile_timeout_secs
                ),
            }),
            Err(WaitError::Spawn(e)) => Some(ExecutionError::Spawn {
                program: program_name(&cmd),
                message: e.to_string(),
            }),
        }
    }

    /// Run a command with a hard wall-clock timeout.
    ///
    /// On Unix the child gets its own process group, so when
    /// `kill_on_drop` fires on timeout the whole tree dies with it —
    /// no orphaned grandchildren keep running in the background.
    async fn wait_with_timeout(
        &self,
        cmd: &mut tokio::process::Command,
        limit: Duration,
    ) -> Result<std::process::Output, WaitError> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        match tokio::time::timeout(limit, cmd.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(WaitError::Spawn(e)),
            Err(_) => Err(WaitError::Timeout),
        }
    }

    fn truncate(&self, text: &str) -> String {
        let max = self.config.stderr_max_bytes;
        if text.len() <= max {
            return text.trim_end().to_string();
        }
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}… [truncated]", &text[..end])
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn program_name(cmd: &tokio::process::Command) -> String {
    cmd.as_std().get_program().to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget_is_ten_seconds() {
        let config = ExecutionConfig::default();
        assert_eq!(config.timeout_secs, 10);
        assert!(config.compile_timeout_secs >= config.timeout_secs);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let engine = Engine::new(ExecutionConfig {
            stderr_max_bytes: 5,
            ..Default::default()
        });
        // 'é' is two bytes; a naive slice at 5 would panic.
        let out = engine.truncate("aaaaébbbb");
        assert!(out.ends_with("[truncated]"));
        assert!(out.starts_with("aaaa"));
    }

    #[test]
    fn truncate_keeps_short_text() {
        let engine = Engine::default();
        assert_eq!(engine.truncate("short\n"), "short");
    }
}
