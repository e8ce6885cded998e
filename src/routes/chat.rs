//! Chat proxy route — forwards one chat turn to the vendor with the
//! server-held key.
//!
//! CONTRACT
//! ========
//! - `OPTIONS` → 200, empty body, never 405. Behind [`crate::routes::app`]
//!   the `CorsLayer` answers every OPTIONS itself; the branch here keeps
//!   the handler correct when mounted without it.
//! - any method but POST → 405 `{"error":"Method Not Allowed"}`
//! - `POST {userMessage, history?}` → 200 with the vendor body verbatim
//! - any failure → 500 `{"error":"Failed to process request","message":...}`
//!
//! CORS headers come from the layer in [`crate::routes::app`].

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::chat::prompt::SYSTEM_PROMPT;
use crate::error::ErrorCode;
use crate::llm::types::{LlmError, Message, Role};
use crate::state::AppState;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatProxyBody {
    #[serde(rename = "userMessage")]
    pub user_message: String,
    #[serde(default)]
    pub history: Vec<Message>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The vendor client failed to initialize at startup; carries the cause.
    #[error("LLM client unavailable: {0}")]
    LlmUnavailable(String),
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error("{0}")]
    Llm(#[from] LlmError),
}

impl ErrorCode for ProxyError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::LlmUnavailable(_) => "E_LLM_UNAVAILABLE",
            Self::InvalidBody(_) => "E_INVALID_BODY",
            Self::Llm(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Llm(e) if e.retryable())
    }
}

// =============================================================================
// HANDLER
// =============================================================================

/// `ANY /chat` — method gate, then forward to the vendor.
pub async fn chat_proxy(State(state): State<AppState>, method: Method, body: Bytes) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    if method != Method::POST {
        return (StatusCode::METHOD_NOT_ALLOWED, Json(json!({ "error": "Method Not Allowed" }))).into_response();
    }

    match forward(&state, &body).await {
        Ok(vendor_body) => (StatusCode::OK, Json(vendor_body)).into_response(),
        Err(e) => {
            warn!(code = e.error_code(), retryable = e.retryable(), error = %e, "proxy: chat request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to process request", "message": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn forward(state: &AppState, raw: &[u8]) -> Result<Value, ProxyError> {
    let body = parse_body(raw)?;
    let llm = state.llm.as_ref().map_err(|cause| ProxyError::LlmUnavailable(cause.clone()))?;

    let messages = build_vendor_messages(body);
    info!(turns = messages.len(), "proxy: forwarding chat turn");
    Ok(llm.chat(&messages).await?)
}

/// A missing `userMessage` is rejected; a blank one is forwarded as is.
pub(crate) fn parse_body(raw: &[u8]) -> Result<ChatProxyBody, ProxyError> {
    serde_json::from_slice(raw).map_err(|e| ProxyError::InvalidBody(e.to_string()))
}

/// System prompt, then the client's user/assistant history, then the new turn.
/// Client-supplied system turns are dropped; the server owns the persona.
pub(crate) fn build_vendor_messages(body: ChatProxyBody) -> Vec<Message> {
    let mut messages = Vec::with_capacity(body.history.len() + 2);
    messages.push(Message::system(SYSTEM_PROMPT));
    messages.extend(
        body.history
            .into_iter()
            .filter(|m| m.role != Role::System),
    );
    messages.push(Message::user(body.user_message));
    messages
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
