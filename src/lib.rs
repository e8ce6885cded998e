//! FinBot — chat widget core, LLM proxy, and usage analytics for the
//! FinRise finance-education site.

pub mod analytics;
pub mod chat;
pub mod error;
pub mod llm;
pub mod routes;
pub mod state;
