//! Chat-completion service client.
//!
//! Same transport idiom as the embedding client: OpenAI-style JSON endpoint,
//! bearer auth, per-request timeout, bounded retry with exponential backoff
//! on rate limits and server errors.

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::config::ChatConfig;

/// Chat-completion transport. One call produces one assistant message.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String>;
}

/// Client for an OpenAI-style `POST /chat/completions` endpoint.
pub struct HttpChatApi {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_retries: u32,
}

impl HttpChatApi {
    pub fn new(config: &ChatConfig) -> Result<Self> {
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
impl ChatApi for HttpChatApi {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        let mut last_err = None;

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
                        let json: Value = response.json().await?;
                        return parse_completion(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();

                    if status.as_u16() == 429 || status.is_server_error() {
                        last_err =
                            Some(anyhow::anyhow!("chat API error {}: {}", status, body_text));
                        continue;
                    }

                    bail!("chat API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("chat completion failed after retries")))
    }
}

/// Extract `choices[0].message.content` from the response.
fn parse_completion(json: &Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("chat response missing choices[0].message.content"))
}
