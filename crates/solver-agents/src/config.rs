//! Solver configuration: the endpoint registry, quality thresholds,
//! retry budget, and timeouts.
//!
//! Configuration is consumed, not owned, by the orchestration core: it is
//! read once at startup (defaults + env overrides, optionally a TOML
//! file) and never mutated during a session. Multiple sessions may share
//! one registry concurrently.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use sandbox::ExecutionConfig;

/// Where an endpoint sits in the routing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankClass {
    /// One of the two concurrently queried top-tier backends.
    Primary,
    Secondary,
    /// Sequential fallback, consulted in list order.
    Retry,
}

impl std::fmt::Display for RankClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Secondary => write!(f, "secondary"),
            Self::Retry => write!(f, "retry"),
        }
    }
}

/// One named model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEndpoint {
    /// Display name, used in logs and failure records.
    pub name: String,
    /// Model identifier sent on the wire.
    pub model_id: String,
    /// Full generate URL (e.g. `http://localhost:11434/api/generate`).
    pub address: String,
    pub rank: RankClass,
}

impl ModelEndpoint {
    pub fn new(
        name: impl Into<String>,
        model_id: impl Into<String>,
        address: impl Into<String>,
        rank: RankClass,
    ) -> Self {
        Self {
            name: name.into(),
            model_id: model_id.into(),
            address: address.into(),
            rank,
        }
    }

    /// Reachability-probe URL, derived from the generate address.
    pub fn probe_address(&self) -> String {
        match self.address.strip_suffix("/api/generate") {
            Some(base) => format!("{base}/api/tags"),
            None => format!("{}/api/tags", self.address.trim_end_matches('/')),
        }
    }
}

/// Sampling options forwarded verbatim in each generate request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingOptions {
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.9,
            max_tokens: 4000,
        }
    }
}

/// Weights of the additive quality heuristic. Tunable, not hardwired.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub code: f64,
    pub complexity: f64,
    pub approach: f64,
    pub test_cases: f64,
    pub explanation: f64,
    /// Code shorter than this many characters scores nothing.
    pub min_code_len: usize,
    pub min_approach_len: usize,
    pub min_explanation_len: usize,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            code: 0.30,
            complexity: 0.20,
            approach: 0.20,
            test_cases: 0.20,
            explanation: 0.10,
            min_code_len: 10,
            min_approach_len: 20,
            min_explanation_len: 50,
        }
    }
}

/// Top-level solver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub primary: ModelEndpoint,
    pub secondary: ModelEndpoint,
    /// Ranked fallback list, consulted in order after the top tier.
    pub retries: Vec<ModelEndpoint>,
    /// Score a candidate must reach to be accepted.
    pub accept_threshold: f64,
    /// Score below which a retry candidate is discarded without testing.
    pub retry_threshold: f64,
    /// Maximum retry attempts per session.
    pub max_attempts: u32,
    /// Statements shorter than this are rejected before any model call.
    pub min_statement_len: usize,
    /// Per-call network timeout (seconds).
    pub request_timeout_secs: u64,
    /// Failure-record ring capacity per session.
    pub failure_log_capacity: usize,
    pub sampling: SamplingOptions,
    pub quality: QualityWeights,
    pub execution: ExecutionConfig,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            primary: ModelEndpoint::new(
                "Claude 3.5",
                env_or("SOLVER_PRIMARY_MODEL", "claude-3.5-sonnet"),
                env_or("SOLVER_PRIMARY_URL", "http://localhost:11434/api/generate"),
                RankClass::Primary,
            ),
            secondary: ModelEndpoint::new(
                "Deepseek v3",
                env_or("SOLVER_SECONDARY_MODEL", "deepseek-coder:33b"),
                env_or(
                    "SOLVER_SECONDARY_URL",
                    "http://localhost:11436/api/generate",
                ),
                RankClass::Secondary,
            ),
            retries: vec![
                ModelEndpoint::new(
                    "GPT-4.1",
                    "gpt-4.1",
                    "http://localhost:11435/api/generate",
                    RankClass::Retry,
                ),
                ModelEndpoint::new(
                    "Grok4",
                    "grok4",
                    "http://localhost:11437/api/generate",
                    RankClass::Retry,
                ),
            ],
            accept_threshold: 0.8,
            retry_threshold: 0.7,
            max_attempts: 4,
            min_statement_len: 10,
            request_timeout_secs: 120,
            failure_log_capacity: 32,
            sampling: SamplingOptions::default(),
            quality: QualityWeights::default(),
            execution: ExecutionConfig::default(),
        }
    }
}

impl SolverConfig {
    /// Load from a TOML file; absent fields fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the session controller cannot honor.
    pub fn validate(&self) -> Result<()> {
        for (label, value) in [
            ("accept_threshold", self.accept_threshold),
            ("retry_threshold", self.retry_threshold),
        ] {
            anyhow::ensure!(
                (0.0..=1.0).contains(&value),
                "{label} must be within [0, 1], got {value}"
            );
        }
        anyhow::ensure!(self.max_attempts > 0, "max_attempts must be positive");
        anyhow::ensure!(
            self.failure_log_capacity > 0,
            "failure_log_capacity must be positive"
        );
        Ok(())
    }

    /// Every configured endpoint: top tier first, then the retry list in
    /// rank order.
    pub fn all_endpoints(&self) -> Vec<&ModelEndpoint> {
        let mut endpoints = vec![&self.primary, &self.secondary];
        endpoints.extend(self.retries.iter());
        endpoints
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = SolverConfig::default();
        config.validate().unwrap();
        assert_eq!(config.retries.len(), 2);
        assert!(config.accept_threshold >= config.retry_threshold);
    }

    #[test]
    fn probe_address_derived_from_generate_url() {
        let ep = ModelEndpoint::new(
            "x",
            "m",
            "http://localhost:11434/api/generate",
            RankClass::Primary,
        );
        assert_eq!(ep.probe_address(), "http://localhost:11434/api/tags");
    }

    #[test]
    fn probe_address_tolerates_bare_base_url() {
        let ep = ModelEndpoint::new("x", "m", "http://localhost:11434/", RankClass::Primary);
        assert_eq!(ep.probe_address(), "http://localhost:11434/api/tags");
    }

    #[test]
    fn all_endpoints_order_is_rank_order() {
        let config = SolverConfig::default();
        let ranks: Vec<RankClass> = config.all_endpoints().iter().map(|e| e.rank).collect();
        assert_eq!(
            ranks,
            vec![
                RankClass::Primary,
                RankClass::Secondary,
                RankClass::Retry,
                RankClass::Retry
            ]
        );
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let config = SolverConfig {
            accept_threshold: 1.2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let toml_src = "accept_threshold = 0.75\nmax_attempts = 2\n";
        let config: SolverConfig = toml::from_str(toml_src).unwrap();
        assert_eq!(config.accept_threshold, 0.75);
        assert_eq!(config.max_attempts, 2);
        assert_eq!(config.retry_threshold, 0.7);
        assert_eq!(config.primary.rank, RankClass::Primary);
    }
}
