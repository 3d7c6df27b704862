//! Generation Request Pipeline
//!
//! Turns collected wizard parameters into a [`GenerationResult`] by talking
//! to the remote generation service, tolerating transient failures:
//! - retry with exponential backoff (5xx and network errors)
//! - an overall timeout per call mode, reported as a `timeout` error
//! - incremental ingestion of streamed responses
//! - normalization of the service's varying response envelopes
//!
//! Three call modes share the machinery: refinement-question fetch (short
//! timeout, small retry budget), final generation, and edit regeneration.

mod client;
pub mod normalize;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::AppConfig;

use client::{classify_transport_error, read_body};
use normalize::NormalizedBody;
pub use types::{
    BRollCue, ErrorKind, GenerationError, GenerationResult, HistoryEntry, QuestionRequest,
    RefinementQuestion, RegenerateRequest, ScriptDocument, ScriptRequest, SoundCue, TextOverlay,
    Transition,
};

// ============================================================================
// Service Seam
// ============================================================================

/// The generation service as consumed by the wizard and chat engine.
///
/// Implemented over HTTP by [`GenerationPipeline`]; mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Fetch the next refinement question. `question: None` in the response
    /// means the service has no more questions.
    async fn next_question(
        &self,
        request: QuestionRequest,
    ) -> Result<RefinementQuestion, GenerationError>;

    /// Generate the final script. Partial text snapshots are published on
    /// `progress` when the service streams its response.
    async fn generate(
        &self,
        request: ScriptRequest,
        progress: Option<mpsc::Sender<String>>,
    ) -> Result<GenerationResult, GenerationError>;

    /// Regenerate with an edit instruction, carrying the previous script.
    async fn regenerate(
        &self,
        request: RegenerateRequest,
        progress: Option<mpsc::Sender<String>>,
    ) -> Result<GenerationResult, GenerationError>;
}

// ============================================================================
// Configuration
// ============================================================================

/// Tuning for the request pipeline. Tests shrink the delays.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub endpoint: String,
    pub question_timeout: Duration,
    pub generation_timeout: Duration,
    pub question_retries: u32,
    pub generation_retries: u32,
    pub retry_base_delay: Duration,
    pub retry_max_delay: Duration,
    pub publish_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.scriptforge.dev/generate".to_string(),
            question_timeout: Duration::from_secs(60),
            generation_timeout: Duration::from_secs(90),
            question_retries: 2,
            generation_retries: 3,
            retry_base_delay: Duration::from_millis(1000),
            retry_max_delay: Duration::from_millis(8000),
            publish_interval: Duration::from_millis(100),
        }
    }
}

impl PipelineConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            endpoint: config.service.endpoint.clone(),
            question_timeout: config.question_timeout(),
            generation_timeout: config.generation_timeout(),
            question_retries: config.service.question_retries,
            generation_retries: config.service.generation_retries,
            ..Self::default()
        }
    }
}

/// Backoff delay before retry `attempt` (1-based): `base * 2^(attempt-1)`,
/// capped at `max`.
pub fn backoff_delay(base: Duration, max: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor).min(max)
}

// ============================================================================
// HTTP Pipeline
// ============================================================================

/// HTTP implementation of [`GenerationService`].
pub struct GenerationPipeline {
    http_client: reqwest::Client,
    config: PipelineConfig,
}

impl GenerationPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// POST `body`, retrying transient failures, and normalize the response.
    ///
    /// Retries cover 5xx statuses and network-level errors while attempts
    /// remain; 4xx statuses are surfaced immediately as non-retryable.
    async fn post_with_retry(
        &self,
        body: &serde_json::Value,
        max_retries: u32,
        progress: Option<&mpsc::Sender<String>>,
    ) -> Result<NormalizedBody, GenerationError> {
        let mut last_error = GenerationError::unknown("no attempts made");

        for attempt in 0..=max_retries {
            if attempt > 0 {
                let delay = backoff_delay(
                    self.config.retry_base_delay,
                    self.config.retry_max_delay,
                    attempt,
                );
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying request");
                tokio::time::sleep(delay).await;
            }

            let response = match self
                .http_client
                .post(&self.config.endpoint)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .json(body)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    last_error = classify_transport_error(&e);
                    tracing::warn!(attempt, error = %last_error, "request attempt failed");
                    continue;
                }
            };

            let status = response.status();
            if status.is_server_error() {
                last_error =
                    GenerationError::server(format!("service returned HTTP {status}"), true);
                tracing::warn!(attempt, %status, "server error, will retry if budget remains");
                continue;
            }
            if status.is_client_error() {
                return Err(GenerationError::server(
                    format!("service rejected request with HTTP {status}"),
                    false,
                ));
            }

            match read_body(response, progress, self.config.publish_interval).await {
                Ok(normalized) => return Ok(normalized),
                Err(e) if e.retryable => {
                    last_error = e;
                    tracing::warn!(attempt, error = %last_error, "body read failed");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error)
    }

    /// Run `fut` under the overall timeout for its call mode.
    async fn with_timeout<T>(
        &self,
        timeout: Duration,
        what: &str,
        fut: impl std::future::Future<Output = Result<T, GenerationError>>,
    ) -> Result<T, GenerationError> {
        match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::timeout(format!(
                "{what} timed out after {}s",
                timeout.as_secs()
            ))),
        }
    }
}

#[async_trait]
impl GenerationService for GenerationPipeline {
    async fn next_question(
        &self,
        request: QuestionRequest,
    ) -> Result<RefinementQuestion, GenerationError> {
        let body = serde_json::to_value(&request)
            .map_err(|e| GenerationError::unknown(format!("request serialization: {e}")))?;

        let normalized = self
            .with_timeout(
                self.config.question_timeout,
                "question fetch",
                self.post_with_retry(&body, self.config.question_retries, None),
            )
            .await?;

        match normalized {
            NormalizedBody::Object(value) => serde_json::from_value(value)
                .map_err(|e| GenerationError::unknown(format!("malformed question response: {e}"))),
            NormalizedBody::Text(text) => {
                // A bare-text reply is treated as the question itself.
                Ok(RefinementQuestion {
                    question: Some(text),
                    options: Vec::new(),
                })
            }
        }
    }

    async fn generate(
        &self,
        request: ScriptRequest,
        progress: Option<mpsc::Sender<String>>,
    ) -> Result<GenerationResult, GenerationError> {
        let body = serde_json::to_value(&request)
            .map_err(|e| GenerationError::unknown(format!("request serialization: {e}")))?;

        let normalized = self
            .with_timeout(
                self.config.generation_timeout,
                "generation",
                self.post_with_retry(&body, self.config.generation_retries, progress.as_ref()),
            )
            .await?;

        Ok(normalized.into())
    }

    async fn regenerate(
        &self,
        request: RegenerateRequest,
        progress: Option<mpsc::Sender<String>>,
    ) -> Result<GenerationResult, GenerationError> {
        let body = serde_json::to_value(&request)
            .map_err(|e| GenerationError::unknown(format!("request serialization: {e}")))?;

        let normalized = self
            .with_timeout(
                self.config.generation_timeout,
                "regeneration",
                self.post_with_retry(&body, self.config.generation_retries, progress.as_ref()),
            )
            .await?;

        Ok(normalized.into())
    }
}
