//! Chat model abstraction, HTTP transport, and the retrying client.
//!
//! - **[`ChatModel`]**: a single request/response round trip.
//! - **[`OpenAiChatModel`]**: calls an OpenAI-compatible
//!   `POST {endpoint}/chat/completions` endpoint.
//! - **[`RetryingClient`]**: wraps any [`ChatModel`] with a per-call
//!   timeout and bounded retry.
//!
//! # Retry Strategy
//!
//! Only timeout-class failures are retried (see [`ModelError::is_timeout`]):
//! - timeout on attempts 1..max-1 → retry immediately, no backoff
//! - timeout on the final attempt → raise
//! - any other failure → raise immediately
//!
//! The per-call timeout is applied inside the loop, so an elapsed call
//! consumes one attempt instead of aborting the whole invocation.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ModelConfig;
use crate::error::ModelError;
use crate::models::{ChatMessage, ModelRequest, ModelResponse};

/// A generative model reachable through a chat completion interface.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the model identifier requests are addressed to.
    fn model_name(&self) -> &str;

    /// Perform exactly one call. Implementations must not retry.
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError>;
}

// ============ OpenAI-compatible transport ============

/// Chat model served over the OpenAI chat completions API.
///
/// Requires the API key environment variable named in
/// [`ModelConfig::api_key_env`] to be set.
pub struct OpenAiChatModel {
    model: String,
    endpoint: String,
    api_key: String,
    max_body_bytes: usize,
    client: reqwest::Client,
}

impl OpenAiChatModel {
    /// Create a transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key variable is not set or the HTTP
    /// client cannot be built.
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| ModelError::MissingApiKey(config.api_key_env.clone()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        Ok(Self {
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key,
            max_body_bytes: config.max_body_bytes,
            client,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        let body = serde_json::to_vec(request).map_err(|e| ModelError::Decode(e.to_string()))?;
        if body.len() > self.max_body_bytes {
            return Err(ModelError::PayloadTooLarge {
                size: body.len(),
                limit: self.max_body_bytes,
            });
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Transport(format!("request timeout: {}", e))
                } else {
                    ModelError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                body: body_text,
            });
        }

        response
            .json::<ModelResponse>()
            .await
            .map_err(|e| ModelError::Decode(e.to_string()))
    }
}

// ============ Retrying client ============

/// Invokes a [`ChatModel`] once per logical request with bounded retry.
///
/// Cheap to clone; clones share the underlying model.
#[derive(Clone)]
pub struct RetryingClient {
    model: Arc<dyn ChatModel>,
    max_attempts: u32,
    timeout: Duration,
}

impl RetryingClient {
    pub fn new(model: Arc<dyn ChatModel>, max_attempts: u32, timeout: Duration) -> Self {
        Self {
            model,
            max_attempts: max_attempts.max(1),
            timeout,
        }
    }

    pub fn from_config(model: Arc<dyn ChatModel>, config: &ModelConfig) -> Self {
        Self::new(
            model,
            config.max_attempts,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    /// Build a request addressed to this client's model.
    pub fn request(&self, messages: Vec<ChatMessage>, temperature: f32) -> ModelRequest {
        ModelRequest {
            model: self.model.model_name().to_string(),
            messages,
            temperature,
        }
    }

    /// Invoke the model, retrying timeout-class failures.
    pub async fn invoke(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        let mut attempt = 1;
        loop {
            let result = match tokio::time::timeout(self.timeout, self.model.complete(request)).await
            {
                Ok(result) => result,
                Err(_) => Err(ModelError::Timeout {
                    timeout_ms: self.timeout.as_millis() as u64,
                }),
            };

            match result {
                Ok(response) => {
                    debug!(attempt, "model call succeeded");
                    return Ok(response);
                }
                Err(e) if e.is_timeout() && attempt < self.max_attempts => {
                    warn!(
                        retry = attempt,
                        max_attempts = self.max_attempts,
                        "model call timed out, retrying: {}",
                        e
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
