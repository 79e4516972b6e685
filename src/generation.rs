//! Draft reply generation
//!
//! [`AnthropicClient`] calls the Messages API, retrying provider overloads.
//! [`MockGenerator`] answers offline in mock mode.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{ApiError, ConfigError, Provider, Result};
use crate::retry::{RetryPolicy, with_overload_retry};

const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 150;
const TEMPERATURE: f32 = 0.7;

/// Everything that shapes one reply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftPrompt {
    pub original_tweet: String,

    /// Handles to imitate
    pub style_accounts: Vec<String>,

    /// Sample tweets in the target voice, blank-line separated
    pub style_examples: String,

    pub custom_instructions: String,
}

impl DraftPrompt {
    pub fn new(original_tweet: impl Into<String>) -> Self {
        Self {
            original_tweet: original_tweet.into(),
            ..Default::default()
        }
    }

    pub fn system_prompt(&self) -> String {
        let mut prompt = String::from("You are an expert at crafting engaging Twitter replies");
        if !self.style_accounts.is_empty() {
            prompt.push_str(" in the style of: ");
            prompt.push_str(&self.style_accounts.join(", "));
        }
        prompt.push('.');

        if !self.style_examples.is_empty() {
            prompt.push_str("\n\nExample tweets in this style:\n\n");
            prompt.push_str(&self.style_examples);
        }

        let instructions = self.custom_instructions.trim();
        if !instructions.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(instructions);
        }
        prompt
    }

    pub fn user_message(&self) -> String {
        format!(
            "Create a reply to this tweet: \"{}\"\n\nMake sure the reply is engaging, appropriate, and within Twitter's character limit. Return only the reply text.",
            self.original_tweet
        )
    }
}

/// Produces reply text for a prompt
#[async_trait]
pub trait DraftGenerator: Send + Sync {
    async fn generate_reply(&self, prompt: &DraftPrompt) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic Messages API client
pub struct AnthropicClient {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
    model: String,
    retry: RetryPolicy,
}

impl AnthropicClient {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_host(
            config.anthropic_api_key.clone(),
            &config.preferences.anthropic_host,
            &config.preferences.model,
        )
    }

    pub fn with_host(api_key: Option<String>, host: &str, model: &str) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: host.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// One Messages API call, no retry
    async fn create_message(&self, prompt: &DraftPrompt) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ConfigError::Missing("ANTHROPIC_API_KEY"))?;

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system: prompt.system_prompt(),
            messages: vec![Message {
                role: "user",
                content: prompt.user_message(),
            }],
        };

        debug!("POST /v1/messages (model {})", self.model);
        let response = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.bytes().await.map_err(ApiError::from)?;

        if !status.is_success() {
            return Err(
                ApiError::from_response(Provider::Anthropic, status, &headers, &bytes).into(),
            );
        }

        let parsed: MessagesResponse = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parsed
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                ApiError::InvalidResponse("Unexpected response format from Anthropic API".into())
                    .into()
            })
    }
}

#[async_trait]
impl DraftGenerator for AnthropicClient {
    async fn generate_reply(&self, prompt: &DraftPrompt) -> Result<String> {
        with_overload_retry(self.retry, || self.create_message(prompt)).await
    }
}

/// Offline generator cycling through fixed replies
#[derive(Debug, Default)]
pub struct MockGenerator {
    calls: AtomicUsize,
}

const MOCK_REPLIES: [&str; 3] = [
    "Great point! This is exactly the kind of insight more people need to hear.",
    "Interesting take. I've been thinking about this a lot lately too.",
    "Couldn't agree more. Thanks for sharing this!",
];

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DraftGenerator for MockGenerator {
    async fn generate_reply(&self, _prompt: &DraftPrompt) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(MOCK_REPLIES[n % MOCK_REPLIES.len()].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use mockito::Matcher;

    fn client(server: &mockito::Server) -> AnthropicClient {
        AnthropicClient::with_host(Some("test-key".to_string()), &server.url(), "test-model")
            .unwrap()
            .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(1)))
    }

    #[test]
    fn test_system_prompt_plain() {
        let prompt = DraftPrompt::new("gm");
        assert_eq!(
            prompt.system_prompt(),
            "You are an expert at crafting engaging Twitter replies."
        );
        assert!(prompt.user_message().contains("\"gm\""));
    }

    #[test]
    fn test_system_prompt_with_style_and_instructions() {
        let prompt = DraftPrompt {
            style_accounts: vec!["jack".to_string(), "jill".to_string()],
            style_examples: "one\n\ntwo".to_string(),
            custom_instructions: "  Be brief. ".to_string(),
            ..DraftPrompt::new("gm")
        };
        let system = prompt.system_prompt();
        assert!(system.contains("in the style of: jack, jill."));
        assert!(system.contains("one\n\ntwo"));
        assert!(system.ends_with("Be brief."));
    }

    #[tokio::test]
    async fn test_generate_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_header("anthropic-version", API_VERSION)
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "test-model",
                "max_tokens": 150
            })))
            .with_status(200)
            .with_body(r#"{"content":[{"type":"text","text":" Nice one! "}]}"#)
            .create_async()
            .await;

        let reply = client(&server)
            .generate_reply(&DraftPrompt::new("gm"))
            .await
            .unwrap();
        assert_eq!(reply, "Nice one!");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_overload_exhausts_retries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(529)
            .with_body(r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#)
            .expect(3)
            .create_async()
            .await;

        let err = client(&server)
            .generate_reply(&DraftPrompt::new("gm"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Api(ApiError::ServiceUnavailable { attempts: 3 })
        ));
        assert_eq!(err.status_code(), 503);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_auth_failure_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .with_status(401)
            .with_body(r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#)
            .expect(1)
            .create_async()
            .await;

        let err = client(&server)
            .generate_reply(&DraftPrompt::new("gm"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Api(ApiError::Unauthorized {
                provider: Provider::Anthropic
            })
        ));
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_key_fails_fast() {
        let client = AnthropicClient::with_host(None, "http://127.0.0.1:9", "m").unwrap();
        let err = client
            .generate_reply(&DraftPrompt::new("gm"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[tokio::test]
    async fn test_mock_generator_cycles() {
        let generator = MockGenerator::new();
        let prompt = DraftPrompt::new("gm");
        let a = generator.generate_reply(&prompt).await.unwrap();
        let b = generator.generate_reply(&prompt).await.unwrap();
        assert_ne!(a, b);
    }
}
