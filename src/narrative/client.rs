//! Ollama chat client for the narrative report.
//!
//! Sends the assembled report data in one non-streaming chat request and
//! returns the model's text untouched.

use super::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::models::ReportPayload;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the narrative client.
#[derive(Debug, Clone)]
pub struct NarrativeConfig {
    pub ollama_url: String,
    pub model_name: String,
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: Option<usize>,
    pub timeout_seconds: u64,
    /// Extra attempts after the first failure.
    pub retries: usize,
    pub show_progress: bool,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model_name: "llama3.2:latest".to_string(),
            temperature: 0.3,
            max_tokens: Some(1000),
            timeout_seconds: 300,
            retries: 2,
            show_progress: true,
        }
    }
}

/// Message in the chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<usize>,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// Client for the narrative-generation model.
pub struct NarrativeClient {
    config: NarrativeConfig,
    http_client: reqwest::Client,
}

impl NarrativeClient {
    pub fn new(config: NarrativeConfig) -> Result<Self> {
        info!(
            "Initializing narrative client with model {} at {}",
            config.model_name, config.ollama_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Generate the prose report for a payload.
    pub async fn generate(&self, payload: &ReportPayload) -> Result<String> {
        let request = self.build_request(&build_prompt(payload));

        let spinner = self.config.show_progress.then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message(format!("Waiting for {}...", self.config.model_name));
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        });

        let result = self.send_with_retries(&request).await;

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        let text = result?;
        info!("Received narrative ({} chars)", text.len());
        Ok(text)
    }

    fn build_request(&self, prompt: &str) -> OllamaChatRequest {
        OllamaChatRequest {
            model: self.config.model_name.clone(),
            messages: vec![
                ChatMessage::new("system", SYSTEM_PROMPT),
                ChatMessage::new("user", prompt),
            ],
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens,
            },
        }
    }

    async fn send_with_retries(&self, request: &OllamaChatRequest) -> Result<String> {
        let attempts = self.config.retries + 1;
        let mut attempt = 1;

        loop {
            match self.send(request).await {
                Ok(text) => return Ok(text),
                Err(e) if attempt < attempts => {
                    let backoff = Duration::from_secs(2 * attempt as u64);
                    warn!(
                        "Narrative request failed (attempt {}/{}): {}. Retrying in {}s",
                        attempt,
                        attempts,
                        e,
                        backoff.as_secs()
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send(&self, request: &OllamaChatRequest) -> Result<String> {
        let url = chat_url(&self.config.ollama_url);
        debug!("POST {} ({} messages)", url, request.messages.len());

        let response = self
            .http_client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!("Request timed out after {}s", self.config.timeout_seconds)
                } else if e.is_connect() {
                    anyhow::anyhow!(
                        "Cannot connect to Ollama at {}. Is Ollama running?",
                        self.config.ollama_url
                    )
                } else {
                    anyhow::anyhow!("Failed to send request: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Ollama API error {}: {}", status, body));
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(chat_response.message.content)
    }
}

fn chat_url(base: &str) -> String {
    format!("{}/api/chat", base.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_narrative_config_default() {
        let config = NarrativeConfig::default();
        assert_eq!(config.model_name, "llama3.2:latest");
        assert_eq!(config.max_tokens, Some(1000));
        assert_eq!(config.retries, 2);
    }

    #[test]
    fn test_chat_url_trims_trailing_slash() {
        assert_eq!(
            chat_url("http://localhost:11434/"),
            "http://localhost:11434/api/chat"
        );
        assert_eq!(chat_url("http://gpu-box:11434"), "http://gpu-box:11434/api/chat");
    }

    #[test]
    fn test_request_shape() {
        let client = NarrativeClient::new(NarrativeConfig {
            max_tokens: None,
            ..NarrativeConfig::default()
        })
        .unwrap();

        let request = client.build_request("hello");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "llama3.2:latest");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
        assert!(json["options"].get("num_predict").is_none());
    }

    #[test]
    fn test_malformed_url_fails_without_network() {
        let client = NarrativeClient::new(NarrativeConfig {
            ollama_url: "http://[::1".to_string(),
            retries: 0,
            show_progress: false,
            ..NarrativeConfig::default()
        })
        .unwrap();
        let request = client.build_request("hello");

        let result = tokio_test::block_on(client.send_with_retries(&request));

        let message = result.unwrap_err().to_string();
        assert!(message.starts_with("Failed to send request"), "{}", message);
    }
}
