//! The orchestration session controller.
//!
//! One session = one end-to-end attempt to solve one problem request:
//! two concurrent top-tier model calls, evaluation against the quality
//! threshold, test execution for the accepted candidate, and a strictly
//! sequential walk of the ranked retry list when quality or tests fail.
//!
//! All mutable state — the state machine, the failure ring, the attempt
//! counter — is owned by the session and dropped with it. Sessions
//! running concurrently share only the read-only configuration, the
//! backend, and the executor.
//!
//! The two-phase fan-out is deliberate: concurrency is reserved for the
//! two most capable backends, while fallback exploration is serialized
//! so each retry benefits from the full accumulated failure context.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use sandbox::{Engine, Language, SuiteReport, TestCase};

use crate::client::AnalysisBackend;
use crate::config::SolverConfig;
use crate::contracts::{
    AnalysisError, AnalysisResult, ProblemRequest, SessionOutcome, SessionStatus, Solution,
};
use crate::errors::SolverError;
use crate::failure_context::{FailureLog, FailureReason, FailureRecord};
use crate::state_machine::{SessionState, StateMachine};

/// The seam through which accepted solutions are verified.
#[async_trait]
pub trait SolutionExecutor: Send + Sync {
    async fn run_suite(&self, code: &str, cases: &[TestCase], language: Language) -> SuiteReport;
}

#[async_trait]
impl SolutionExecutor for Engine {
    async fn run_suite(&self, code: &str, cases: &[TestCase], language: Language) -> SuiteReport {
        Engine::run_suite(self, code, cases, language).await
    }
}

/// One solving session. Single-use: `solve` consumes it.
pub struct Session<'a> {
    config: &'a SolverConfig,
    backend: &'a dyn AnalysisBackend,
    executor: &'a dyn SolutionExecutor,
    id: Uuid,
    machine: StateMachine,
    failures: FailureLog,
    attempt_count: u32,
    started_at: DateTime<Utc>,
}

impl<'a> Session<'a> {
    pub fn new(
        config: &'a SolverConfig,
        backend: &'a dyn AnalysisBackend,
        executor: &'a dyn SolutionExecutor,
    ) -> Self {
        Self {
            config,
            backend,
            executor,
            id: Uuid::new_v4(),
            machine: StateMachine::new(),
            failures: FailureLog::new(config.failure_log_capacity),
            attempt_count: 0,
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Point-in-time snapshot for status reporting.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            session_id: self.id.to_string(),
            attempt_count: self.attempt_count,
            max_attempts: self.config.max_attempts,
            failure_count: self.failures.len(),
            started_at: self.started_at,
        }
    }

    /// Drive the session to a terminal state.
    ///
    /// Returns `Err` only for requests that fail validation — no
    /// endpoint is contacted in that case. Every other path terminates
    /// in an outcome: an accepted solution with test evidence, or a
    /// structured failure carrying the full failure trail.
    pub async fn solve(mut self, request: ProblemRequest) -> Result<SessionOutcome, SolverError> {
        request.validate(self.config.min_statement_len)?;

        info!(
            session = %self.id,
            language = %request.language,
            test_cases = request.test_cases.len(),
            "Session started"
        );

        // Phase 1: concurrent top tier, joined regardless of individual
        // failure — an errored call is a zero-quality candidate.
        self.machine
            .advance(SessionState::ConcurrentAnalysis, None)?;
        let (primary, secondary) = tokio::join!(
            self.backend.query(&self.config.primary, &request, &[]),
            self.backend.query(&self.config.secondary, &request, &[]),
        );

        self.machine.advance(SessionState::Evaluation, None)?;
        info!(
            session = %self.id,
            primary = primary.quality,
            secondary = secondary.quality,
            "Top-tier candidates scored"
        );

        // Strictly higher score wins; ties favor primary.
        let (best, other) = if secondary.quality > primary.quality {
            (secondary, primary)
        } else {
            (primary, secondary)
        };

        match best.solution.clone() {
            Some(solution) if best.quality >= self.config.accept_threshold => {
                // The losing candidate is context for later retries only
                // if it failed a gate itself, not if it merely lost the
                // tie while also clearing the threshold.
                if other.error.is_some() || other.quality < self.config.accept_threshold {
                    self.record_rejection(&other, self.config.accept_threshold);
                }
                self.machine.advance(
                    SessionState::Accepted,
                    Some(&format!(
                        "{} scored {:.2} >= {:.2}",
                        best.source_model, best.quality, self.config.accept_threshold
                    )),
                )?;
                if let Some(outcome) = self
                    .test_gate(&request, solution, best.source_model.clone())
                    .await?
                {
                    return Ok(outcome);
                }
            }
            _ => {
                self.record_rejection(&best, self.config.accept_threshold);
                self.record_rejection(&other, self.config.accept_threshold);
                self.machine.advance(
                    SessionState::Retrying,
                    Some(&format!(
                        "best score {:.2} below {:.2}",
                        best.quality, self.config.accept_threshold
                    )),
                )?;
            }
        }

        // Phase 2: sequential fallback walk, in rank order, each call
        // enriched with the accumulated failure context.
        self.retry_phase(&request).await
    }

    async fn retry_phase(
        &mut self,
        request: &ProblemRequest,
    ) -> Result<SessionOutcome, SolverError> {
        for endpoint in &self.config.retries {
            if self.attempt_count >= self.config.max_attempts {
                break;
            }
            self.attempt_count += 1;
            self.machine.set_attempt(self.attempt_count);

            let context = self.failures.to_vec();
            info!(
                session = %self.id,
                attempt = self.attempt_count,
                model = %endpoint.name,
                context_records = context.len(),
                "Retry attempt"
            );

            let result = self.backend.query(endpoint, request, &context).await;

            match result.solution.clone() {
                Some(solution) if result.quality >= self.config.retry_threshold => {
                    self.machine.advance(
                        SessionState::Accepted,
                        Some(&format!(
                            "{} scored {:.2} >= {:.2}",
                            result.source_model, result.quality, self.config.retry_threshold
                        )),
                    )?;
                    if let Some(outcome) = self
                        .test_gate(request, solution, result.source_model.clone())
                        .await?
                    {
                        return Ok(outcome);
                    }
                    // Test gate recorded the failure and moved back to
                    // Retrying; continue with the next candidate.
                }
                _ => {
                    self.record_rejection(&result, self.config.retry_threshold);
                    self.machine.advance(
                        SessionState::Retrying,
                        Some(&format!("{} rejected", result.source_model)),
                    )?;
                }
            }
        }

        let error = SolverError::RetryExhausted {
            attempts: self.attempt_count,
        };
        self.machine
            .advance(SessionState::Exhausted, Some(&error.to_string()))?;
        warn!(
            session = %self.id,
            attempts = self.attempt_count,
            failures = self.failures.len(),
            "Session exhausted"
        );
        Ok(SessionOutcome::exhausted(&error, self.failures.to_vec()))
    }

    /// Run the accepted candidate through the test gate.
    ///
    /// Returns `Some(outcome)` on terminal success. Returns `None` when
    /// tests failed — the failure is recorded and the state machine is
    /// back at `Retrying`.
    async fn test_gate(
        &mut self,
        request: &ProblemRequest,
        solution: Solution,
        model: String,
    ) -> Result<Option<SessionOutcome>, SolverError> {
        if request.test_cases.is_empty() {
            self.machine
                .advance(SessionState::Success, Some("no test cases supplied"))?;
            info!(session = %self.id, model = %model, "Session succeeded without test execution");
            return Ok(Some(SessionOutcome::succeeded(
                solution,
                None,
                model,
                self.attempt_count,
                self.failures.to_vec(),
            )));
        }

        self.machine.advance(SessionState::TestExecution, None)?;
        let report = self
            .executor
            .run_suite(&solution.code, &request.test_cases, request.language)
            .await;

        if report.all_passed {
            self.machine
                .advance(SessionState::Success, Some(&report.compact_text()))?;
            info!(
                session = %self.id,
                model = %model,
                report = %report.compact_text(),
                "Session succeeded"
            );
            return Ok(Some(SessionOutcome::succeeded(
                solution,
                Some(report.outcomes),
                model,
                self.attempt_count,
                self.failures.to_vec(),
            )));
        }

        let failed = report.total - report.passed;
        let reason = FailureReason::TestsFailed {
            failed,
            total: report.total,
        };
        self.failures.push(
            FailureRecord::new(self.attempt_count, model, reason)
                .with_solution(solution)
                .with_test_outcomes(report.outcomes),
        );
        self.machine.advance(
            SessionState::Retrying,
            Some(&format!("{failed}/{} cases failed", report.total)),
        )?;
        Ok(None)
    }

    /// Record a candidate that did not make it past a quality gate.
    fn record_rejection(&mut self, result: &AnalysisResult, threshold: f64) {
        let reason = match &result.error {
            Some(AnalysisError::Transport { message }) => FailureReason::Transport {
                message: message.clone(),
            },
            Some(AnalysisError::Parse { message }) => FailureReason::Parse {
                message: message.clone(),
            },
            None => FailureReason::LowQuality {
                score: result.quality,
                threshold,
            },
        };

        let mut record =
            FailureRecord::new(self.attempt_count, result.source_model.clone(), reason);
        if let Some(solution) = &result.solution {
            record = record.with_solution(solution.clone());
        }
        self.failures.push(record);
    }
}

/// Owns the shared pieces — config, HTTP client, execution engine —
/// and spawns one [`Session`] per request. Safe to share across
/// concurrent callers.
pub struct Solver {
    config: SolverConfig,
    client: crate::client::ModelClient,
    engine: Engine,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Result<Self, SolverError> {
        config
            .validate()
            .map_err(|e| SolverError::Configuration(e.to_string()))?;
        let client = crate::client::ModelClient::new(&config)?;
        let engine = Engine::new(config.execution.clone());
        Ok(Self {
            config,
            client,
            engine,
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve one problem request in a fresh session.
    pub async fn solve(&self, request: ProblemRequest) -> Result<SessionOutcome, SolverError> {
        Session::new(&self.config, &self.client, &self.engine)
            .solve(request)
            .await
    }

    /// Probe every configured endpoint. Status reporting only.
    pub async fn health(&self) -> Vec<crate::client::HealthReport> {
        let mut reports = Vec::new();
        for endpoint in self.config.all_endpoints() {
            reports.push(crate::client::check_endpoint(endpoint).await);
        }
        reports
    }
}
