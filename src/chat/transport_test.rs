use super::*;
use crate::error::ErrorCode;
use axum::Router;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, extract::State};
use serde_json::json;
use std::sync::{Arc, Mutex};

// =============================================================================
// helpers
// =============================================================================

/// Serve `router` on an ephemeral local port and return the `/chat` URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/chat")
}

fn completion(text: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "model": "llama-3.1-8b-instant",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": text }, "finish_reason": "stop" }]
    })
}

fn transport(url: String) -> ProxyTransport {
    ProxyTransport::new(url, Duration::from_secs(5)).unwrap()
}

fn conversation() -> Vec<Message> {
    vec![
        Message::system("sys"),
        Message::user("What is an ETF?"),
        Message::assistant("A basket of securities."),
        Message::user("How do I buy one?"),
    ]
}

// =============================================================================
// ProxyRequest
// =============================================================================

#[test]
fn proxy_request_splits_last_user_turn_and_history() {
    let convo = conversation();
    let req = ProxyRequest::from_conversation(&convo).unwrap();
    assert_eq!(req.user_message, "How do I buy one?");
    assert_eq!(req.history, vec![&convo[1], &convo[2]]);
}

#[test]
fn proxy_request_serializes_camel_case_and_roles_in_order() {
    let convo = conversation();
    let json = serde_json::to_value(ProxyRequest::from_conversation(&convo).unwrap()).unwrap();
    assert_eq!(
        json,
        json!({
            "userMessage": "How do I buy one?",
            "history": [
                { "role": "user", "content": "What is an ETF?" },
                { "role": "assistant", "content": "A basket of securities." }
            ]
        })
    );
}

#[test]
fn proxy_request_first_turn_omits_history() {
    let convo = vec![Message::system("sys"), Message::user("hi")];
    let json = serde_json::to_value(ProxyRequest::from_conversation(&convo).unwrap()).unwrap();
    assert_eq!(json, json!({ "userMessage": "hi" }));
}

#[test]
fn proxy_request_rejects_trailing_assistant_turn() {
    let convo = vec![Message::user("hi"), Message::assistant("hello")];
    let err = ProxyRequest::from_conversation(&convo).unwrap_err();
    assert_eq!(err.kind, TransportErrorKind::InvalidRequest);
}

#[test]
fn proxy_request_rejects_empty_conversation() {
    let err = ProxyRequest::from_conversation(&[]).unwrap_err();
    assert_eq!(err.kind, TransportErrorKind::InvalidRequest);
}

// =============================================================================
// TransportError
// =============================================================================

#[test]
fn transport_error_display_includes_status_when_present() {
    assert_eq!(TransportError::new(Some(502), "bad gateway").to_string(), "transport error (status 502): bad gateway");
    assert_eq!(TransportError::new(None, "refused").to_string(), "transport error: refused");
}

#[test]
fn transport_error_codes() {
    assert_eq!(TransportError::new(None, "x").error_code(), "E_TRANSPORT_NETWORK");
    assert_eq!(TransportError::new(Some(200), "x").error_code(), "E_TRANSPORT_MALFORMED");
    assert_eq!(TransportError::new(Some(500), "x").error_code(), "E_TRANSPORT_STATUS");
    assert_eq!(TransportError::invalid_request("x").error_code(), "E_TRANSPORT_INVALID_REQUEST");
    assert!(TransportError::new(None, "x").retryable());
    assert!(!TransportError::invalid_request("x").retryable());
    assert!(!TransportError::new(Some(200), "x").retryable());
    assert!(TransportError::new(Some(503), "x").retryable());
    assert!(!TransportError::new(Some(400), "x").retryable());
}

#[test]
fn proxy_error_message_prefers_message_field() {
    let body = json!({ "error": "Failed to process request", "message": "GROQ_API_KEY is not configured" }).to_string();
    assert_eq!(proxy_error_message(&body), "GROQ_API_KEY is not configured");
    assert_eq!(proxy_error_message(r#"{"error":"Method Not Allowed"}"#), "Method Not Allowed");
    assert_eq!(proxy_error_message("plain text"), "plain text");
}

// =============================================================================
// ProxyTransport over HTTP
// =============================================================================

#[tokio::test]
async fn send_posts_conversation_and_returns_reply() {
    let captured: Arc<Mutex<Option<serde_json::Value>>> = Arc::new(Mutex::new(None));
    let router = Router::new()
        .route(
            "/chat",
            post(
                |State(captured): State<Arc<Mutex<Option<serde_json::Value>>>>, Json(body): Json<serde_json::Value>| async move {
                    *captured.lock().unwrap() = Some(body);
                    Json(completion("Use a brokerage app."))
                },
            ),
        )
        .with_state(captured.clone());
    let url = serve(router).await;

    let reply = transport(url).send(&conversation()).await.unwrap();
    assert_eq!(reply, "Use a brokerage app.");

    let body = captured.lock().unwrap().take().unwrap();
    assert_eq!(body["userMessage"], "How do I buy one?");
    assert_eq!(body["history"][0]["role"], "user");
    assert_eq!(body["history"][1]["role"], "assistant");
    assert_eq!(body["history"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn send_maps_proxy_500_to_transport_error() {
    let router = Router::new().route(
        "/chat",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to process request", "message": "GROQ_API_KEY is not configured" })),
            )
        }),
    );
    let url = serve(router).await;

    let err = transport(url).send(&conversation()).await.unwrap_err();
    assert_eq!(err.status, Some(500));
    assert!(err.message.contains("GROQ_API_KEY"));
}

#[tokio::test]
async fn send_rejects_body_without_choices() {
    let router = Router::new().route("/chat", post(|| async { Json(json!({ "choices": [] })) }));
    let url = serve(router).await;

    let err = transport(url).send(&conversation()).await.unwrap_err();
    assert_eq!(err.status, Some(200));
    assert!(err.message.contains("choices[0]"));
}

#[tokio::test]
async fn send_rejects_non_json_body() {
    let router = Router::new().route("/chat", post(|| async { "not json" }));
    let url = serve(router).await;

    let err = transport(url).send(&conversation()).await.unwrap_err();
    assert_eq!(err.status, Some(200));
}

#[tokio::test]
async fn send_times_out() {
    let router = Router::new().route(
        "/chat",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(completion("too late"))
        }),
    );
    let url = serve(router).await;

    let slow = ProxyTransport::new(url, Duration::from_millis(100)).unwrap();
    let err = slow.send(&conversation()).await.unwrap_err();
    assert_eq!(err.status, None);
    assert!(err.message.contains("timed out"));
}

#[tokio::test]
async fn send_to_closed_port_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = transport(format!("http://{addr}/chat"))
        .send(&conversation())
        .await
        .unwrap_err();
    assert_eq!(err.status, None);
}

#[tokio::test]
async fn send_without_user_turn_fails_before_network() {
    // Unroutable URL: the request must never be attempted.
    let err = transport("http://127.0.0.1:9/chat".into())
        .send(&[Message::system("sys")])
        .await
        .unwrap_err();
    assert!(err.message.contains("user turn"));
    assert_eq!(err.kind, TransportErrorKind::InvalidRequest);
    assert_eq!(err.error_code(), "E_TRANSPORT_INVALID_REQUEST");
    assert!(!err.retryable());
}
