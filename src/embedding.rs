//! Embedding generation with validation.
//!
//! [`EmbeddingApi`] is the raw transport contract: one call per input,
//! returning the service's `embedding` payload unvalidated. [`Embedder`]
//! wraps it with the pipeline's rules — reject blank input locally, flatten
//! a nested response to its first row, require a flat numeric vector — and
//! converts every failure into an [`EmbedError`] so callers can treat a bad
//! chunk as skippable instead of aborting a whole batch.
//!
//! # Retry strategy (HTTP client)
//!
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately, marked permanent
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! Retries live here, at the call site that issues many independent calls;
//! the [`Embedder`] itself never retries.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::EmbeddingConfig;
use crate::error::EmbedError;

/// Raw embedding transport. Implementations perform exactly one service
/// call per invocation and do not validate the returned payload.
#[async_trait]
pub trait EmbeddingApi: Send + Sync {
    /// Fetch the raw `embedding` payload for `text`.
    async fn embed_raw(&self, text: &str) -> Result<Value, EmbedError>;
}

/// Validating wrapper around an [`EmbeddingApi`].
///
/// Cheap to clone; the underlying client is shared.
#[derive(Clone)]
pub struct Embedder {
    api: std::sync::Arc<dyn EmbeddingApi>,
    /// Expected vector dimensionality, checked by [`Embedder::embed_checked`].
    dims: usize,
}

impl Embedder {
    pub fn new(api: std::sync::Arc<dyn EmbeddingApi>, dims: usize) -> Self {
        Self { api, dims }
    }

    /// Embed one text span.
    ///
    /// Fails with [`EmbedError::InvalidInput`] for blank input without
    /// calling the service. Service and shape failures are logged and
    /// returned as typed errors.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        if text.trim().is_empty() {
            tracing::warn!("embedding input must be a non-empty string");
            return Err(EmbedError::InvalidInput);
        }

        let raw = self.api.embed_raw(text).await.map_err(|e| {
            tracing::warn!(error = %e, "embedding call failed");
            e
        })?;

        parse_vector(&raw)
    }

    /// [`Embedder::embed`] plus a dimensionality check against the
    /// configured index width. Used on the ingestion path so a model
    /// mismatch is caught before upsert rather than at query time.
    pub async fn embed_checked(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let vector = self.embed(text).await?;
        if vector.len() != self.dims {
            return Err(EmbedError::InvalidVector(format!(
                "expected {} dimensions, got {}",
                self.dims,
                vector.len()
            )));
        }
        Ok(vector)
    }
}

/// Validate the raw payload into a flat `f32` vector.
///
/// A nested (two-level) response is unwrapped to its first row; anything
/// that is not a numeric sequence is rejected.
fn parse_vector(raw: &Value) -> Result<Vec<f32>, EmbedError> {
    let arr = raw
        .as_array()
        .ok_or_else(|| EmbedError::InvalidVector("payload is not an array".to_string()))?;

    if arr.is_empty() {
        return Err(EmbedError::InvalidVector("payload is empty".to_string()));
    }

    let flat: &[Value] = if arr[0].is_array() {
        arr[0].as_array().unwrap().as_slice()
    } else {
        arr.as_slice()
    };

    if flat.is_empty() {
        return Err(EmbedError::InvalidVector("vector is empty".to_string()));
    }

    flat.iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| EmbedError::InvalidVector("non-numeric element".to_string()))
        })
        .collect()
}

/// Client for an OpenAI-style `POST /embeddings` endpoint.
pub struct HttpEmbeddingApi {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_retries: u32,
}

impl HttpEmbeddingApi {
    /// Build the client. The API key is read once from the environment
    /// variable named in the config.
    pub fn new(config: &EmbeddingConfig) -> anyhow::Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow::anyhow!("{} environment variable not set", config.api_key_env))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl EmbeddingApi for HttpEmbeddingApi {
    async fn embed_raw(&self, text: &str) -> Result<Value, EmbedError> {
        let body = serde_json::json!({
            "model": self.model,
            "input": text,
        });

        let mut last_err: Option<EmbedError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(&self.endpoint)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: Value = response.json().await.map_err(|e| {
                            EmbedError::Service {
                                message: format!("invalid JSON body: {}", e),
                                transient: false,
                            }
                        })?;
                        return extract_embedding_payload(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();

                    // Rate limited or server error: retry with backoff.
                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err = Some(EmbedError::Service {
                            message: format!("embedding API error {}: {}", status, body_text),
                            transient: true,
                        });
                        continue;
                    }

                    // Other client errors (auth, bad request) are permanent.
                    return Err(EmbedError::Service {
                        message: format!("embedding API error {}: {}", status, body_text),
                        transient: false,
                    });
                }
                Err(e) => {
                    last_err = Some(EmbedError::Service {
                        message: e.to_string(),
                        transient: true,
                    });
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or(EmbedError::Service {
            message: "embedding failed after retries".to_string(),
            transient: true,
        }))
    }
}

/// Pull `data[0].embedding` out of the response, unparsed.
fn extract_embedding_payload(json: &Value) -> Result<Value, EmbedError> {
    json.get("data")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .and_then(|item| item.get("embedding"))
        .cloned()
        .ok_or_else(|| EmbedError::Service {
            message: "response missing data[0].embedding".to_string(),
            transient: false,
        })
}
