//! Text-generation backends

use crate::error::{BackendError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Accepts a prompt and returns generated text, or fails
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Connection settings for an OpenAI-compatible chat-completions endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    pub api_base: String,
    #[serde(default = "default_path")]
    pub path: String,
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_path() -> String {
    "/v1/chat/completions".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

/// Chat-completions client over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    url: String,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if !config.api_key.is_empty() {
            let value = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| BackendError::Unavailable(format!("invalid api key header: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .default_headers(headers)
            .build()?;
        let url = format!("{}{}", config.api_base.trim_end_matches('/'), config.path);

        Ok(Self { client, url, config })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl GenerationBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self.client.post(&self.url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response.json().await?;
        completion_text(&json)
    }
}

/// Pull the first choice's message content out of a chat-completions response
fn completion_text(json: &Value) -> Result<String> {
    json.get("choices")
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_string)
        .ok_or_else(|| BackendError::InvalidResponse("missing choices[0].message.content".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_text() {
        let json = serde_json::json!({
            "choices": [
                { "message": { "role": "assistant", "content": "Try the red dress (image: 12.jpg)." } }
            ]
        });
        assert_eq!(
            completion_text(&json).unwrap(),
            "Try the red dress (image: 12.jpg)."
        );
    }

    #[test]
    fn test_completion_text_missing_content() {
        let json = serde_json::json!({ "choices": [] });
        assert!(matches!(
            completion_text(&json),
            Err(BackendError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_backend_url() {
        let backend = HttpBackend::new(BackendConfig {
            api_base: "http://localhost:8080/".to_string(),
            path: default_path(),
            model: "gemma-2b-it".to_string(),
            api_key: String::new(),
            temperature: 0.2,
            request_timeout_ms: 1_000,
        })
        .unwrap();
        assert_eq!(backend.url(), "http://localhost:8080/v1/chat/completions");
        assert_eq!(backend.name(), "gemma-2b-it");
    }
}
