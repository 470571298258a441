//! Chat-completion API access with exponential backoff retry logic.
//!
//! This module talks to an OpenAI-compatible chat completions endpoint and
//! wraps every call in retry logic with exponential backoff and jitter, so
//! transient failures (rate limits, network blips, temporary server errors)
//! do not surface as backend failures.
//!
//! # Architecture
//!
//! - [`ChatCompletion`]: core trait for one prompt/response exchange
//! - [`ChatClient`]: reqwest-backed implementation of the wire protocol
//! - [`RetryChat`]: decorator that adds retry logic to any implementation
//!
//! # Retry strategy
//!
//! - Maximum 5 retry attempts
//! - Exponential backoff starting at 1 second
//! - Maximum delay capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use std::time::{Duration, Instant};

use rand::{rng, Rng};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{error, instrument, warn};

use crate::error::{NewsError, Result};

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
/// Default model when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
/// Environment variable holding the API credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
/// Optional endpoint override, for proxies and compatible providers.
pub const ENDPOINT_ENV: &str = "OPENAI_API_URL";
/// Optional model override.
pub const MODEL_ENV: &str = "OPENAI_MODEL";

const MAX_RETRIES: usize = 5;
const BASE_DELAY: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One system+user exchange against a chat backend.
pub trait ChatCompletion {
    /// Send the prompt pair and return the assistant's text.
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

/// OpenAI-compatible chat client.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_retries: usize,
    base_delay: Duration,
}

impl ChatClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build HTTP client with timeout; using default");
                reqwest::Client::new()
            });
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            max_retries: MAX_RETRIES,
            base_delay: BASE_DELAY,
        }
    }

    /// Override the retry policy (tests shrink it to avoid real backoff).
    pub fn with_retry(mut self, max_retries: usize, base_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.base_delay = base_delay;
        self
    }

    /// Build a client from the environment, or `None` when no credential is
    /// present. Absence of the key is not an error — callers degrade to
    /// their heuristic backend.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty())?;
        let endpoint =
            std::env::var(ENDPOINT_ENV).unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string());
        let model = std::env::var(MODEL_ENV).unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Some(Self::new(endpoint, api_key, model))
    }

    /// Send one exchange with this client's retry policy applied.
    pub async fn complete_with_backoff(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let api = RetryChat::new(self.clone(), self.max_retries, self.base_delay);
        api.complete(system, user, max_tokens, temperature).await
    }
}

impl ChatCompletion for ChatClient {
    #[instrument(level = "debug", skip_all)]
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens,
            temperature,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(NewsError::Backend(format!(
                "chat API returned {status}: {detail}"
            )));
        }

        let parsed: ChatResponse = response.json().await?;
        let choice = parsed
            .choices
            .first()
            .ok_or_else(|| NewsError::Backend("chat API response has no choices".to_string()))?;
        Ok(choice.message.content.trim().to_string())
    }
}

/// Decorator that adds exponential backoff retry logic to any
/// [`ChatCompletion`] implementation.
///
/// The delay between retries follows
/// `min(base_delay * 2^(attempt-1), max_delay) + jitter(0..250ms)`.
pub struct RetryChat<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryChat<T>
where
    T: ChatCompletion,
{
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl<T> ChatCompletion for RetryChat<T>
where
    T: ChatCompletion,
{
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self
                .inner
                .complete(system, user, max_tokens, temperature)
                .await
            {
                Ok(response) => return Ok(response),
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "complete() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "complete() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CHAT_BODY: &str = r#"{
        "model": "gpt-3.5-turbo",
        "choices": [{
            "message": {"role": "assistant", "content": "  tech  "},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 1, "total_tokens": 11}
    }"#;

    #[tokio::test]
    async fn test_complete_parses_and_trims_content() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(CHAT_BODY)
            .create_async()
            .await;

        let client = ChatClient::new(server.url(), "test-key", "gpt-3.5-turbo");
        let result = client.complete("system", "user", 50, 0.1).await.unwrap();

        assert_eq!(result, "tech");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_complete_maps_error_status_to_backend_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = ChatClient::new(server.url(), "test-key", "gpt-3.5-turbo");
        let result = client.complete("system", "user", 50, 0.1).await;

        assert!(matches!(result, Err(NewsError::Backend(_))));
    }

    /// Fails a fixed number of times, then succeeds.
    struct Flaky {
        failures_left: AtomicUsize,
    }

    impl ChatCompletion for Flaky {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _max_tokens: u32,
            _temperature: f32,
        ) -> Result<String> {
            if self.failures_left.fetch_sub(1, Ordering::SeqCst) > 0 {
                Err(NewsError::Backend("transient".to_string()))
            } else {
                Ok("recovered".to_string())
            }
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_after_transient_failures() {
        let flaky = Flaky {
            failures_left: AtomicUsize::new(2),
        };
        let api = RetryChat::new(flaky, 3, Duration::from_millis(1));

        let result = api.complete("s", "u", 10, 0.0).await.unwrap();
        assert_eq!(result, "recovered");
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let flaky = Flaky {
            failures_left: AtomicUsize::new(usize::MAX / 2),
        };
        let api = RetryChat::new(flaky, 2, Duration::from_millis(1));

        assert!(api.complete("s", "u", 10, 0.0).await.is_err());
    }

    #[test]
    fn test_from_env_requires_credential() {
        // The test environment does not set the key; construction degrades.
        if std::env::var(API_KEY_ENV).is_err() {
            assert!(ChatClient::from_env().is_none());
        }
    }
}
