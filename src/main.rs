use std::sync::Arc;

use finbot::error::ErrorCode;
use finbot::llm::LlmClient;
use finbot::routes;
use finbot::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8888".into())
        .parse()
        .expect("invalid PORT");

    // Non-fatal: the proxy still serves, and /chat answers 500 with the cause.
    let state = match LlmClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "LLM client initialized");
            AppState::new(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(code = e.error_code(), error = %e, "LLM client not configured, chat requests will fail");
            AppState::without_llm(&e)
        }
    };

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "finbot proxy listening");
    axum::serve(listener, app).await.expect("server failed");
}
