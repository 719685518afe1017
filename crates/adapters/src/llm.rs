// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The language-model provider: an abstract text-completion
//! service returning structured outputs. Every call site in `nwb-llm` /
//! `nwb-workers` treats this as an enrichment with a rule-based fallback, so
//! `LlmError` is never fatal to a caller.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no LLM provider configured")]
    Unavailable,
    #[error("request to LLM provider failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("LLM provider returned an error response: {0}")]
    ProviderError(String),
    #[error("LLM response did not contain the expected content")]
    MalformedResponse,
    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),
}

/// One text-completion request: a system prompt (instructions + embedded
/// schema/context) and a user turn (the text to act on).
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

impl LlmRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self { system: system.into(), user: user.into(), max_tokens: 1024 }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: LlmRequest) -> Result<String, LlmError>;
}

/// Always reports unavailable. Selected by the server when
/// `ANTHROPIC_API_KEY` is unset, so every LLM-enhanced code path exercises
/// its rule-based fallback.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLlmClient;

#[async_trait]
impl LlmClient for NullLlmClient {
    async fn complete(&self, _request: LlmRequest) -> Result<String, LlmError> {
        Err(LlmError::Unavailable)
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Calls the Anthropic Messages API over HTTPS via `reqwest`.
pub struct HttpLlmClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl HttpLlmClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: "claude-3-5-sonnet-latest".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, request: LlmRequest) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": request.max_tokens,
            "system": request.system,
            "messages": [{"role": "user", "content": request.user}],
        });

        let response = tokio::time::timeout(
            self.timeout,
            self.http
                .post("https://api.anthropic.com/v1/messages")
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .json(&body)
                .send(),
        )
        .await
        .map_err(|_| LlmError::Timeout(self.timeout))?
        .map_err(LlmError::Request)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ProviderError(format!("{status}: {text}")));
        }

        let parsed: MessagesResponse = response.json().await.map_err(LlmError::Request)?;
        parsed
            .content
            .into_iter()
            .find_map(|b| b.text)
            .ok_or(LlmError::MalformedResponse)
    }
}

/// Scripted completion queue for tests: returns replies in order, or
/// [`LlmError::Unavailable`] once exhausted (or if configured to fail
/// immediately).
#[cfg(any(test, feature = "test-support"))]
pub struct FakeLlmClient {
    pub replies: parking_lot::Mutex<std::collections::VecDeque<Result<String, LlmError>>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeLlmClient {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
        Self { replies: parking_lot::Mutex::new(replies.into()) }
    }

    pub fn always_unavailable() -> Self {
        Self::new(vec![])
    }

    pub fn push_reply(&self, reply: Result<String, LlmError>) {
        self.replies.lock().push_back(reply);
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl LlmClient for FakeLlmClient {
    async fn complete(&self, _request: LlmRequest) -> Result<String, LlmError> {
        self.replies.lock().pop_front().unwrap_or(Err(LlmError::Unavailable))
    }
}
