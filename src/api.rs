//! Completion API interaction.
//!
//! The classifier talks to the model through the [`AskAsync`] trait so it
//! can be driven by a canned responder in tests. [`AnthropicClient`] is the
//! production implementation against the Anthropic Messages API.
//!
//! No retries: a failed call fails the run.

use crate::config::{self, Config};
use crate::error::PipelineError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use url::Url;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Trait for async LLM interaction.
///
/// Implementors send a single prompt and return the model's text payload.
pub trait AskAsync {
    /// Send `prompt` as one user message and return the reply text.
    ///
    /// # Errors
    ///
    /// [`PipelineError::Call`] when the endpoint cannot be reached or fails,
    /// [`PipelineError::EmptyResponse`] when it answers without text.
    async fn ask(&self, prompt: &str) -> Result<String, PipelineError>;
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [WireMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

impl MessagesResponse {
    /// Text of the first content block, if it has any.
    fn first_text(self) -> Option<String> {
        self.content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .filter(|text| !text.trim().is_empty())
    }
}

/// Anthropic Messages API client.
#[derive(Debug)]
pub struct AnthropicClient<'a> {
    http: &'a Client,
    base_url: &'a Url,
    api_key: &'a str,
    model: &'a str,
    max_tokens: u32,
}

impl<'a> AnthropicClient<'a> {
    pub fn new(http: &'a Client, config: &'a Config) -> Self {
        Self {
            http,
            base_url: &config.anthropic_api_url,
            api_key: &config.anthropic_api_key,
            model: &config.model,
            max_tokens: config.max_tokens,
        }
    }
}

impl AskAsync for AnthropicClient<'_> {
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, prompt: &str) -> Result<String, PipelineError> {
        let t0 = Instant::now();
        let url = config::endpoint(self.base_url, "messages");
        let request = MessagesRequest {
            model: self.model,
            max_tokens: self.max_tokens,
            messages: [WireMessage {
                role: "user",
                content: prompt,
            }],
        };
        debug!(prompt_bytes = prompt.len(), max_tokens = self.max_tokens, "Sending completion request");

        let response = self
            .http
            .post(&url)
            .header("x-api-key", self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Call(format!("request to completion API failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, elapsed_ms = t0.elapsed().as_millis(), "Completion API returned an error");
            return Err(PipelineError::Call(format!("completion API returned {status}: {body}")));
        }

        let body: MessagesResponse = response.json().await.map_err(|e| {
            PipelineError::Call(format!("could not decode completion API response: {e}"))
        })?;
        let stop_reason = body.stop_reason.clone().unwrap_or_default();

        let text = body.first_text().ok_or(PipelineError::EmptyResponse)?;
        info!(
            elapsed_ms = t0.elapsed().as_millis(),
            response_bytes = text.len(),
            %stop_reason,
            "Completion received"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_MODEL, test_config};
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::path::PathBuf;

    fn config_for(server_url: &str) -> Config {
        let mut config = test_config("http://127.0.0.1:9", server_url, PathBuf::from("status.json"));
        config.max_tokens = 256;
        config
    }

    #[tokio::test]
    async fn test_ask_returns_first_block_text() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/messages")
            .match_header("x-api-key", "model-key")
            .match_header("anthropic-version", ANTHROPIC_VERSION)
            .match_body(Matcher::PartialJson(json!({
                "model": DEFAULT_MODEL,
                "max_tokens": 256,
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "content": [
                        {"type": "text", "text": "first"},
                        {"type": "text", "text": "second"}
                    ],
                    "stop_reason": "end_turn"
                })
                .to_string(),
            )
            .create_async()
            .await;

        let config = config_for(&server.url());
        let http = Client::new();
        let client = AnthropicClient::new(&http, &config);

        assert_eq!(client.ask("hello").await.unwrap(), "first");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ask_empty_content_is_empty_response() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/messages")
            .with_status(200)
            .with_body(r#"{"content":[],"stop_reason":"end_turn"}"#)
            .create_async()
            .await;

        let config = config_for(&server.url());
        let http = Client::new();
        let client = AnthropicClient::new(&http, &config);

        assert!(matches!(client.ask("hello").await, Err(PipelineError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_ask_blank_text_is_empty_response() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/messages")
            .with_status(200)
            .with_body(r#"{"content":[{"type":"text","text":"  \n"}]}"#)
            .create_async()
            .await;

        let config = config_for(&server.url());
        let http = Client::new();
        let client = AnthropicClient::new(&http, &config);

        assert!(matches!(client.ask("hello").await, Err(PipelineError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_ask_http_error_is_call_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/messages")
            .with_status(529)
            .with_body(r#"{"type":"error","error":{"type":"overloaded_error"}}"#)
            .create_async()
            .await;

        let config = config_for(&server.url());
        let http = Client::new();
        let client = AnthropicClient::new(&http, &config);

        match client.ask("hello").await {
            Err(PipelineError::Call(msg)) => assert!(msg.contains("529")),
            other => panic!("expected call error, got {other:?}"),
        }
    }
}
