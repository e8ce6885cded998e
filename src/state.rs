//! Shared application state for the proxy.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It is built once in `main` and holds only the vendor client, or the
//! reason the client could not be built; the proxy keeps no per-request or
//! per-user state.

use std::sync::Arc;

use crate::llm::LlmChat;
use crate::llm::types::LlmError;

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; the client is Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    /// The vendor client, or the startup error that prevented building it.
    /// On `Err` every chat request answers 500 with that cause.
    pub llm: Result<Arc<dyn LlmChat>, String>,
}

impl AppState {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmChat>) -> Self {
        Self { llm: Ok(llm) }
    }

    /// State for a proxy whose vendor client failed to initialize.
    #[must_use]
    pub fn without_llm(cause: &LlmError) -> Self {
        Self { llm: Err(cause.to_string()) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
