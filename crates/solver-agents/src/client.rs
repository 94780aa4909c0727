//! Model client — one request/response exchange per call.
//!
//! Transport failures, non-success statuses, and unparsable bodies never
//! escape this boundary: they come back as a zero-quality
//! [`AnalysisResult`] with `error` set, and the session controller
//! treats them as bad candidates rather than hard failures.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{ModelEndpoint, SamplingOptions, SolverConfig};
use crate::contracts::{AnalysisError, AnalysisResult, ProblemRequest};
use crate::errors::SolverError;
use crate::failure_context::FailureRecord;
use crate::prompts;
use crate::response::parse_response;
use crate::scoring;

/// The seam the session controller calls models through. One object
/// serves every endpoint; the endpoint to target is an argument.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Issue one exchange against one endpoint. Never errors: failed
    /// calls yield a zero-quality result.
    async fn query(
        &self,
        endpoint: &ModelEndpoint,
        request: &ProblemRequest,
        failures: &[FailureRecord],
    ) -> AnalysisResult;
}

/// Request body of the generate protocol.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: &'a SamplingOptions,
}

/// Response body of the generate protocol.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// HTTP implementation of [`AnalysisBackend`].
pub struct ModelClient {
    http: reqwest::Client,
    sampling: SamplingOptions,
    quality: crate::config::QualityWeights,
}

impl ModelClient {
    /// Build a client honoring the configured per-call timeout.
    pub fn new(config: &SolverConfig) -> Result<Self, SolverError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| SolverError::Configuration(format!("http client: {e}")))?;
        Ok(Self {
            http,
            sampling: config.sampling.clone(),
            quality: config.quality.clone(),
        })
    }

    /// Perform the raw exchange, classifying every failure mode.
    async fn exchange(
        &self,
        endpoint: &ModelEndpoint,
        prompt: &str,
    ) -> Result<String, SolverError> {
        let body = GenerateRequest {
            model: &endpoint.model_id,
            prompt,
            stream: false,
            options: &self.sampling,
        };

        let response = self
            .http
            .post(&endpoint.address)
            .json(&body)
            .send()
            .await
            .map_err(|e| SolverError::transport(&endpoint.name, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SolverError::transport(
                &endpoint.name,
                format!("HTTP {status}"),
            ));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| SolverError::Parse {
            endpoint: endpoint.name.clone(),
            message: format!("malformed envelope: {e}"),
        })?;
        Ok(body.response)
    }
}

#[async_trait]
impl AnalysisBackend for ModelClient {
    async fn query(
        &self,
        endpoint: &ModelEndpoint,
        request: &ProblemRequest,
        failures: &[FailureRecord],
    ) -> AnalysisResult {
        let prompt = if failures.is_empty() {
            prompts::build_solve_prompt(&request.statement, request.language)
        } else {
            prompts::build_retry_prompt(&request.statement, request.language, failures.iter())
        };

        info!(
            model = %endpoint.name,
            rank = %endpoint.rank,
            failures = failures.len(),
            prompt_version = prompts::PROMPT_VERSION,
            "Querying model"
        );

        let raw = match self.exchange(endpoint, &prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(model = %endpoint.name, error = %e, "Model call failed");
                return AnalysisResult::from_failure(&endpoint.name, &e);
            }
        };

        match parse_response(&raw) {
            Ok(parsed) => {
                let quality = scoring::score(&parsed.solution, &self.quality);
                debug!(
                    model = %endpoint.name,
                    variant = %parsed.variant,
                    quality,
                    "Response parsed"
                );
                AnalysisResult {
                    source_model: endpoint.name.clone(),
                    raw_response: raw,
                    solution: Some(parsed.solution),
                    quality,
                    error: None,
                }
            }
            Err(e) => {
                warn!(model = %endpoint.name, error = %e, "Response failed to parse");
                AnalysisResult {
                    source_model: endpoint.name.clone(),
                    raw_response: raw,
                    solution: None,
                    quality: 0.0,
                    error: Some(AnalysisError::Parse {
                        message: e.to_string(),
                    }),
                }
            }
        }
    }
}

/// Result of one endpoint reachability probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub name: String,
    pub address: String,
    pub healthy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Probe one endpoint's reachability. Status reporting only — routing
/// inside a session never consults this.
pub async fn check_endpoint(endpoint: &ModelEndpoint) -> HealthReport {
    let probe = endpoint.probe_address();
    let result = reqwest::Client::new()
        .get(&probe)
        .timeout(std::time::Duration::from_secs(5))
        .send()
        .await;

    match result {
        Ok(resp) if resp.status().is_success() => HealthReport {
            name: endpoint.name.clone(),
            address: endpoint.address.clone(),
            healthy: true,
            error: None,
        },
        Ok(resp) => HealthReport {
            name: endpoint.name.clone(),
            address: endpoint.address.clone(),
            healthy: false,
            error: Some(format!("HTTP {}", resp.status())),
        },
        Err(e) => HealthReport {
            name: endpoint.name.clone(),
            address: endpoint.address.clone(),
            healthy: false,
            error: Some(e.to_string()),
        },
    }
}
