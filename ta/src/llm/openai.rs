//! OpenAI API client implementation
//!
//! Implements the LlmClient trait for OpenAI's Chat Completions API.

use async_trait::async_trait;
use colored::Colorize;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage};
use crate::config::LlmConfig;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Ceiling for a single retry delay
const MAX_BACKOFF_MS: u64 = 60_000;

/// Exponential delay before retry `attempt` (0-based), capped at [`MAX_BACKOFF_MS`]
fn backoff_ms(attempt: u32) -> u64 {
    INITIAL_BACKOFF_MS
        .saturating_mul(2u64.saturating_pow(attempt))
        .min(MAX_BACKOFF_MS)
}

/// OpenAI API client
pub struct OpenAIClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    temperature: f32,
    max_retries: u32,
    verbose: bool,
}

impl OpenAIClient {
    /// Create a new client from configuration
    ///
    /// The API key is read once here from the configured environment variable.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Self::with_api_key(config, api_key)
    }

    /// Create a client with an explicit key, bypassing the environment
    pub fn with_api_key(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self, LlmError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key: api_key.into(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_retries: config.max_retries,
            verbose: config.verbose,
        })
    }

    /// Build the request body for the OpenAI API
    ///
    /// The user turn goes first and the system prompt last, matching the
    /// order the prompts were written against.
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");
        let max_tokens = request.max_tokens.min(self.max_tokens);

        serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": request.user_message},
                {"role": "system", "content": request.system_prompt},
            ],
            "temperature": self.temperature,
            "max_tokens": max_tokens,
        })
    }

    /// Parse the OpenAI API response
    fn parse_response(&self, api_response: OpenAIResponse) -> Result<CompletionResponse, LlmError> {
        debug!(choices = api_response.choices.len(), "parse_response: called");
        let choice = api_response.choices.into_iter().next().ok_or(LlmError::MissingChoices)?;

        let usage = api_response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            content: choice.message.content,
            stop_reason: StopReason::from_openai(choice.finish_reason.as_deref()),
            usage,
        })
    }
}

impl OpenAIClient {
    /// One POST to the chat completions endpoint
    async fn send_once(&self, url: &str, body: &serde_json::Value) -> Result<CompletionResponse, LlmError> {
        let response = self.http.post(url).bearer_auth(&self.api_key).json(body).send().await?;
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }

        let text = response.text().await?;
        if self.verbose {
            println!("{}", format!("Response from OpenAI API: {}", text).yellow());
        }
        if !(200..300).contains(&status) {
            return Err(LlmError::ApiError { status, message: text });
        }

        let api_response: OpenAIResponse = serde_json::from_str(&text)?;
        self.parse_response(api_response)
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    /// Send the request, retrying transient failures with exponential backoff
    ///
    /// A 429 is returned at once; the caller decides what a rate limit means.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "complete: called");
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_request_body(&request);

        let mut attempt = 0;
        loop {
            match self.send_once(&url, &body).await {
                Ok(response) => {
                    debug!(attempt, "complete: success");
                    return Ok(response);
                }
                Err(e) if attempt < self.max_retries && e.is_retryable() && !e.is_rate_limit() => {
                    let backoff = backoff_ms(attempt);
                    attempt += 1;
                    warn!(attempt, backoff_ms = backoff, error = %e, "complete: transient failure, retrying");
                    tokio::time::sleep(Duration::from_millis(backoff)).await;
                }
                Err(e) => {
                    debug!(attempt, error = %e, "complete: giving up");
                    return Err(e);
                }
            }
        }
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(max_tokens: u32) -> OpenAIClient {
        let config = LlmConfig {
            max_tokens,
            ..Default::default()
        };
        OpenAIClient::with_api_key(&config, "test-key").unwrap()
    }

    #[test]
    fn test_build_request_body_basic() {
        let client = test_client(1500);

        let request = CompletionRequest::single_turn("Hello", "You are helpful", 1000);

        let body = client.build_request_body(&request);

        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["max_tokens"], 1000);
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Hello");
        assert_eq!(body["messages"][1]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "You are helpful");
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        assert_eq!(backoff_ms(0), 1000);
        assert_eq!(backoff_ms(1), 2000);
        assert_eq!(backoff_ms(3), 8000);
        assert_eq!(backoff_ms(6), MAX_BACKOFF_MS);
        assert_eq!(backoff_ms(64), MAX_BACKOFF_MS);
        assert_eq!(backoff_ms(u32::MAX), MAX_BACKOFF_MS);
    }

    #[test]
    fn test_max_tokens_capped() {
        let client = test_client(1000);
        let request = CompletionRequest::single_turn("q", "Test", 5000);
        let body = client.build_request_body(&request);
        assert_eq!(body["max_tokens"], 1000);
    }

    #[test]
    fn test_parse_response_without_choices() {
        let client = test_client(1000);
        let api_response: OpenAIResponse =
            serde_json::from_str(r#"{"error": {"message": "invalid api key"}}"#).unwrap();
        assert!(matches!(client.parse_response(api_response), Err(LlmError::MissingChoices)));
    }

    #[test]
    fn test_parse_response_first_choice() {
        let client = test_client(1000);
        let api_response: OpenAIResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"content": "Task: Buy milk"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 4}}"#,
        )
        .unwrap();
        let response = client.parse_response(api_response).unwrap();
        assert_eq!(response.content.as_deref(), Some("Task: Buy milk"));
        assert_eq!(response.usage.input_tokens, 12);
        assert_eq!(response.stop_reason, StopReason::EndTurn);
    }

    fn server_client(url: &str) -> OpenAIClient {
        let config = LlmConfig {
            base_url: url.to_string(),
            max_retries: 2,
            ..Default::default()
        };
        OpenAIClient::with_api_key(&config, "test-key").unwrap()
    }

    #[tokio::test]
    async fn test_rate_limit_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(429)
            .with_header("retry-after", "7")
            .expect(1)
            .create_async()
            .await;

        let err = server_client(&server.url())
            .complete(CompletionRequest::single_turn("q", "s", 10))
            .await
            .unwrap_err();

        mock.assert_async().await;
        match err {
            LlmError::RateLimited { retry_after } => assert_eq!(retry_after, Duration::from_secs(7)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_body(r#"{"error": {"message": "bad key"}}"#)
            .expect(1)
            .create_async()
            .await;

        let err = server_client(&server.url())
            .complete(CompletionRequest::single_turn("q", "s", 10))
            .await
            .unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, LlmError::ApiError { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_sends_bearer_key_and_reads_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({"model": "gpt-3.5-turbo"})))
            .with_status(200)
            .with_body(r#"{"choices": [{"message": {"content": "2025-03-01 10:00:00"}, "finish_reason": "stop"}]}"#)
            .create_async()
            .await;

        let response = server_client(&server.url())
            .complete(CompletionRequest::single_turn("tomorrow", "s", 10))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.content.as_deref(), Some("2025-03-01 10:00:00"));
    }
}
