//! Error code conventions shared by the proxy and the chat client.

/// Trait for domain errors that can be reported with a stable machine code.
///
/// `error_code` feeds structured logs and the proxy's JSON error body;
/// `retryable` tells callers whether the same request may succeed later.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}
