//! Chat widget core: session lifecycle, transport, and content suggestions.
//!
//! ARCHITECTURE
//! ============
//! `session` sequences one turn at a time over a `transport`, then asks
//! `suggest` for related articles and tools. `prompt` holds the persona
//! text shared with the proxy.

pub mod prompt;
pub mod session;
pub mod suggest;
pub mod transport;

pub use session::{ChatEvent, ChatSession, Conversation, Sender, SessionError};
pub use suggest::{Suggestion, SuggestionKind, match_suggestions};
pub use transport::{ChatTransport, ProxyTransport, TransportError, TransportErrorKind};
