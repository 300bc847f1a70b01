//! Async client for the n1 chat completions endpoint.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::retry::{RetryConfig, with_retry};
use crate::client::check_status;
use crate::config::{DEFAULT_N1_TIMEOUT, sanitize_base_url};
use crate::error::Result;
use crate::n1::payload::{TrimConfig, trim_to_fit};
use crate::n1::screenshot::redact_for_log;
use crate::{ChatCompletion, ChatRequest, Message, RawChatResponse};

/// Request body borrowing the caller's history, so a step does not copy
/// every screenshot before serializing it.
#[derive(Serialize)]
struct StepRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Client for the OpenAI-compatible n1 API (`POST {base}/chat/completions`).
pub struct N1Client {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    retry: RetryConfig,
    trim: TrimConfig,
}

impl N1Client {
    /// Create a client for `base_url` (e.g. `https://api.yutori.com/v1`).
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("yutori-rs/", env!("CARGO_PKG_VERSION")))
            .timeout(DEFAULT_N1_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", sanitize_base_url(base_url)),
            api_key: api_key.into(),
            retry: RetryConfig::default(),
            trim: TrimConfig::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Payload limits applied by [`step`](Self::step).
    pub fn with_trim(mut self, trim: TrimConfig) -> Self {
        self.trim = trim;
        self
    }

    pub fn trim_config(&self) -> &TrimConfig {
        &self.trim
    }

    /// Send one chat completion request.
    pub async fn chat(&self, body: &ChatRequest) -> Result<ChatCompletion> {
        debug!(
            "n1 request: model={}, messages={}, temp={:?}",
            body.model,
            body.messages.len(),
            body.temperature,
        );
        self.post(body).await
    }

    async fn post<B: Serialize + ?Sized>(&self, body: &B) -> Result<ChatCompletion> {
        let start = Instant::now();

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        debug!(
            "n1 response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        check_status(status, &text)?;

        let parsed: RawChatResponse = serde_json::from_str(&text)?;

        if let Some(ref usage) = parsed.usage {
            debug!(
                "Token usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens.unwrap_or(0),
                usage.completion_tokens.unwrap_or(0),
                usage.total_tokens.unwrap_or(0),
            );
        }

        let completion = ChatCompletion::from(parsed);
        debug!(
            "n1 output: {} chars text, {} tool call(s)",
            completion.content.as_ref().map_or(0, |s| s.len()),
            completion.tool_calls.len()
        );
        Ok(completion)
    }

    /// [`chat`](Self::chat), retrying transient failures.
    pub async fn chat_with_retry(&self, body: &ChatRequest) -> Result<ChatCompletion> {
        with_retry(&self.retry, || self.chat(body)).await
    }

    /// One agent step: fit `messages` to the payload limit, then request
    /// the next action.
    ///
    /// Old screenshots are stripped from `messages` in place, so the
    /// caller's history stays trimmed for the following steps.
    pub async fn step(
        &self,
        messages: &mut [Message],
        model: &str,
        temperature: Option<f32>,
    ) -> Result<ChatCompletion> {
        let outcome = trim_to_fit(messages, &self.trim);
        if outcome.trimmed() {
            info!("{outcome}");
        }
        if !outcome.fits(self.trim.max_bytes) {
            warn!(
                "Payload still {} bytes over the {}-byte limit after trimming",
                outcome.size_bytes - self.trim.max_bytes,
                self.trim.max_bytes
            );
        }
        if let Some(last) = messages.last() {
            debug!("Latest message: {:?}", redact_for_log(last));
        }

        let body = StepRequest {
            model,
            messages: &*messages,
            temperature,
        };
        debug!(
            "n1 step: model={model}, messages={}, payload={} bytes",
            messages.len(),
            outcome.size_bytes
        );
        with_retry(&self.retry, || self.post(&body)).await
    }
}
