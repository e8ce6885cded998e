//! Chat transport — one conversation in, one reply text out.
//!
//! DESIGN
//! ======
//! The session depends on the [`ChatTransport`] trait only. The shipped
//! implementation, [`ProxyTransport`], talks to the trusted proxy that owns
//! the vendor credential; no transport in this crate ever holds the key.
//! The proxy prepends its own system prompt, so the system turn is not
//! forwarded; the newest user turn travels as `userMessage` and the
//! remaining user/assistant turns as `history`, in order.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;

use crate::llm::openai::chat_completions_reply;
use crate::llm::types::{Message, Role};

pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:8888/chat";
pub const DEFAULT_TRANSPORT_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// ERROR
// =============================================================================

/// Where a round trip failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The conversation could not be turned into a request; nothing was sent.
    InvalidRequest,
    /// No HTTP response: connect failure, reset, or timeout.
    Network,
    /// The proxy answered with a non-2xx status.
    Status,
    /// A 2xx body without a usable reply.
    Malformed,
}

/// A failed round trip. `status` is `None` when no HTTP response was received.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("transport error{}: {message}", status_suffix(.status))]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

impl TransportError {
    /// Classify by HTTP status: none is a network failure, 2xx a malformed
    /// body, anything else a status failure.
    #[must_use]
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        let kind = match status {
            None => TransportErrorKind::Network,
            Some(200..=299) => TransportErrorKind::Malformed,
            Some(_) => TransportErrorKind::Status,
        };
        Self { kind, status, message: message.into() }
    }

    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self { kind: TransportErrorKind::InvalidRequest, status: None, message: message.into() }
    }
}

impl crate::error::ErrorCode for TransportError {
    fn error_code(&self) -> &'static str {
        match self.kind {
            TransportErrorKind::InvalidRequest => "E_TRANSPORT_INVALID_REQUEST",
            TransportErrorKind::Network => "E_TRANSPORT_NETWORK",
            TransportErrorKind::Status => "E_TRANSPORT_STATUS",
            TransportErrorKind::Malformed => "E_TRANSPORT_MALFORMED",
        }
    }

    fn retryable(&self) -> bool {
        match self.kind {
            TransportErrorKind::Network => true,
            TransportErrorKind::Status => matches!(self.status, Some(429 | 500..=599)),
            TransportErrorKind::InvalidRequest | TransportErrorKind::Malformed => false,
        }
    }
}

// =============================================================================
// TRAIT
// =============================================================================

/// Turns a conversation into a single reply text via one round trip.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`TransportError`] on network failure, timeout, any non-2xx
    /// status, or a body without `choices[0].message.content`.
    async fn send(&self, conversation: &[Message]) -> Result<String, TransportError>;
}

// =============================================================================
// PROXY TRANSPORT
// =============================================================================

/// Request body accepted by the proxy's `/chat` endpoint.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ProxyRequest<'a> {
    #[serde(rename = "userMessage")]
    pub user_message: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<&'a Message>,
}

impl<'a> ProxyRequest<'a> {
    /// Split a conversation into the proxy body.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the conversation does not end with a
    /// user turn; there is nothing to ask the model.
    pub fn from_conversation(conversation: &'a [Message]) -> Result<Self, TransportError> {
        let Some((last, earlier)) = conversation.split_last() else {
            return Err(TransportError::invalid_request("empty conversation"));
        };
        if last.role != Role::User {
            return Err(TransportError::invalid_request("conversation must end with a user turn"));
        }
        let history = earlier.iter().filter(|m| m.role != Role::System).collect();
        Ok(Self { user_message: &last.content, history })
    }
}

pub struct ProxyTransport {
    http: reqwest::Client,
    url: String,
}

impl ProxyTransport {
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::new(None, format!("HTTP client build failed: {e}")))?;
        Ok(Self { http, url: url.into() })
    }

    /// Build from `FINBOT_PROXY_URL` and `FINBOT_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, TransportError> {
        let url = std::env::var("FINBOT_PROXY_URL").unwrap_or_else(|_| DEFAULT_PROXY_URL.to_string());
        let secs = crate::llm::config::env_parse("FINBOT_TIMEOUT_SECS", DEFAULT_TRANSPORT_TIMEOUT_SECS);
        Self::new(url, Duration::from_secs(secs))
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl ChatTransport for ProxyTransport {
    async fn send(&self, conversation: &[Message]) -> Result<String, TransportError> {
        let body = ProxyRequest::from_conversation(conversation)?;
        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::new(None, describe_reqwest_error(&e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::new(Some(status.as_u16()), describe_reqwest_error(&e)))?;
        if !status.is_success() {
            return Err(TransportError::new(Some(status.as_u16()), proxy_error_message(&text)));
        }

        let root: Value =
            serde_json::from_str(&text).map_err(|e| TransportError::new(Some(status.as_u16()), e.to_string()))?;
        chat_completions_reply(&root).map_err(|e| TransportError::new(Some(status.as_u16()), e.to_string()))
    }
}

fn describe_reqwest_error(err: &reqwest::Error) -> String {
    if err.is_timeout() { format!("request timed out: {err}") } else { err.to_string() }
}

/// Prefer the proxy's `message` field, then `error`, then the raw body.
fn proxy_error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    parsed
        .as_ref()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
        })
        .map_or_else(|| body.to_string(), str::to_owned)
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
