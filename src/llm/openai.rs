//! OpenAI-compatible `/chat/completions` client (Groq by default).
//!
//! The proxy relays the vendor body verbatim, so `chat` returns the parsed
//! JSON document rather than a reduced reply. Reply extraction lives in
//! [`chat_completions_reply`] and is shared with the client-side transport.

use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use super::config::{GenerationParams, LlmTimeouts};
use super::types::{LlmError, Message};

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    params: GenerationParams,
}

impl OpenAiClient {
    /// # Errors
    ///
    /// Returns [`LlmError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn new(
        api_key: String,
        base_url: String,
        params: GenerationParams,
        timeouts: LlmTimeouts,
    ) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.request_secs))
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .build()
            .map_err(|e| LlmError::HttpClientBuild(e.to_string()))?;
        let base_url = base_url.trim_end_matches('/').to_string();
        Ok(Self { http, api_key, base_url, params })
    }

    /// POST one chat completion request and return the vendor body.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, non-2xx status, or a non-JSON body.
    pub async fn chat(&self, model: &str, messages: &[Message]) -> Result<Value, LlmError> {
        let body = CcRequest {
            model,
            messages,
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
        };
        let text = self.send_json("/chat/completions", &body).await?;
        parse_chat_completions_body(&text)
    }

    async fn send_json(&self, path: &str, body: &impl Serialize) -> Result<String, LlmError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::ApiRequest(e.to_string()))?;
        if !status.is_success() {
            return Err(LlmError::ApiResponse { status: status.as_u16(), body: text });
        }
        Ok(text)
    }
}

// =============================================================================
// CHAT COMPLETIONS — wire types
// =============================================================================

#[derive(Serialize)]
struct CcRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

/// Parse a vendor body into JSON without interpreting it.
///
/// # Errors
///
/// Returns [`LlmError::ApiParse`] when the body is not valid JSON.
pub fn parse_chat_completions_body(json_text: &str) -> Result<Value, LlmError> {
    serde_json::from_str(json_text).map_err(|e| LlmError::ApiParse(e.to_string()))
}

/// Extract `choices[0].message.content` from a chat completions body.
///
/// # Errors
///
/// Returns [`LlmError::ApiParse`] when `choices` is missing or empty, or the
/// first choice carries no string content.
pub fn chat_completions_reply(root: &Value) -> Result<String, LlmError> {
    let Some(choice) = root
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|arr| arr.first())
    else {
        return Err(LlmError::ApiParse("chat_completions: missing choices[0]".to_string()));
    };
    choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| LlmError::ApiParse("chat_completions: missing choices[0].message.content".to_string()))
}

#[cfg(test)]
#[path = "openai_test.rs"]
mod tests;
