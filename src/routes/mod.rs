//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The proxy exposes the chat endpoint under `/chat` and under the legacy
//! serverless function path so existing widgets keep working. The widget is
//! served from another origin, so every route sits behind a permissive
//! `CorsLayer`.

pub mod chat;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{any, get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Legacy path of the serverless chat function.
pub const LEGACY_CHAT_PATH: &str = "/.netlify/functions/groq";

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/chat", any(chat::chat_proxy))
        .route(LEGACY_CHAT_PATH, any(chat::chat_proxy))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
