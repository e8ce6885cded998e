//! Chat session — the send → await → render lifecycle for one widget.
//!
//! DESIGN
//! ======
//! Each session owns its conversation (system prompt first, then user and
//! assistant turns) and a single-flight `pending` flag. The flag is taken
//! with a compare-and-swap before the first suspension point, so a second
//! `send` while one is in flight is rejected with [`SessionError::Busy`]
//! without touching the conversation or the transport. A drop guard
//! releases the flag, which also covers a caller dropping the `send`
//! future mid-flight (cancellation on widget teardown).
//!
//! Rendering is the caller's job: the session pushes [`ChatEvent`]s on an
//! unbounded channel in the order the widget should draw them.
//!
//! Failed turns are reported as a transient fallback notice and are never
//! written into the conversation as assistant content.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::prompt::{FALLBACK_REPLY, SYSTEM_PROMPT};
use super::suggest::{Suggestion, fired_topics, match_suggestions};
use super::transport::ChatTransport;
use crate::error::ErrorCode;
use crate::llm::types::Message;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// Observable UI events, emitted in render order. A turn starts with the
/// user's own message, then the typing indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    TypingStarted,
    TypingEnded,
    /// `transient` is set for the failure notice, which is not part of the
    /// conversation history.
    MessageReceived { text: String, sender: Sender, transient: bool },
    /// Possibly empty; renderers skip the block when there is nothing to show.
    SuggestionsAvailable(Vec<Suggestion>),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session busy: a message is already in flight")]
    Busy,
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Busy => "E_SESSION_BUSY",
        }
    }

    fn retryable(&self) -> bool {
        true
    }
}

/// Append-only, role-tagged message log for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    #[must_use]
    pub fn new(system_prompt: &str) -> Self {
        Self { messages: vec![Message::system(system_prompt)] }
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
    }
}

// =============================================================================
// PENDING GUARD
// =============================================================================

struct PendingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> PendingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// =============================================================================
// SESSION
// =============================================================================

pub struct ChatSession {
    id: Uuid,
    transport: Arc<dyn ChatTransport>,
    conversation: Mutex<Conversation>,
    pending: AtomicBool,
    events: mpsc::UnboundedSender<ChatEvent>,
}

impl ChatSession {
    /// Open a session whose conversation holds only the system prompt.
    /// Returns the session and the receiving end of its event stream.
    #[must_use]
    pub fn start(transport: Arc<dyn ChatTransport>) -> (Self, mpsc::UnboundedReceiver<ChatEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self {
            id: Uuid::new_v4(),
            transport,
            conversation: Mutex::new(Conversation::new(SYSTEM_PROMPT)),
            pending: AtomicBool::new(false),
            events: tx,
        };
        info!(session = %session.id, "chat: session started");
        (session, rx)
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Snapshot of the conversation so far.
    #[must_use]
    pub fn conversation(&self) -> Conversation {
        self.lock_conversation().clone()
    }

    /// Send one user turn and wait for the reply.
    ///
    /// Returns `Ok(Some(reply))` on success and `Ok(None)` when the round
    /// trip failed; in that case the fallback notice has already been
    /// emitted and the session is ready for the next turn.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Busy`] if another send is still in flight.
    pub async fn send(&self, user_text: &str) -> Result<Option<String>, SessionError> {
        let Some(guard) = PendingGuard::acquire(&self.pending) else {
            warn!(session = %self.id, "chat: send rejected, request already in flight");
            return Err(SessionError::Busy);
        };

        let snapshot = {
            let mut conversation = self.lock_conversation();
            conversation.push(Message::user(user_text));
            conversation.messages().to_vec()
        };
        self.emit(ChatEvent::MessageReceived { text: user_text.to_string(), sender: Sender::User, transient: false });
        self.emit(ChatEvent::TypingStarted);
        info!(session = %self.id, turns = snapshot.len(), input_len = user_text.len(), "chat: sending turn");

        match self.transport.send(&snapshot).await {
            Ok(reply) => {
                self.lock_conversation().push(Message::assistant(reply.clone()));
                drop(guard);
                info!(session = %self.id, reply_len = reply.len(), "chat: reply received");

                self.emit(ChatEvent::TypingEnded);
                self.emit(ChatEvent::MessageReceived { text: reply.clone(), sender: Sender::Bot, transient: false });

                let suggestions = match_suggestions(user_text);
                debug!(
                    session = %self.id,
                    topics = ?fired_topics(user_text),
                    shown = suggestions.len(),
                    "chat: suggestions matched"
                );
                self.emit(ChatEvent::SuggestionsAvailable(suggestions));
                Ok(Some(reply))
            }
            Err(e) => {
                drop(guard);
                warn!(
                    session = %self.id,
                    code = e.error_code(),
                    retryable = e.retryable(),
                    error = %e,
                    "chat: turn failed"
                );
                self.emit(ChatEvent::TypingEnded);
                self.emit(ChatEvent::MessageReceived {
                    text: FALLBACK_REPLY.to_string(),
                    sender: Sender::Bot,
                    transient: true,
                });
                Ok(None)
            }
        }
    }

    fn lock_conversation(&self) -> MutexGuard<'_, Conversation> {
        self.conversation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ChatEvent) {
        if self.events.send(event).is_err() {
            debug!(session = %self.id, "chat: event dropped, no renderer attached");
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
