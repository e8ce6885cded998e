//! Terminal front end for the chat widget.
//!
//! Reads one message per line from stdin, sends it through the proxy, and
//! renders the session's events. `/stats` prints local usage counters and
//! `/quit` (or EOF) ends the session.
//!
//! Analytics are tracked in memory and flushed once per finished turn and
//! once at exit. The file write runs on the blocking pool after the lock
//! is released.

use std::io::Write as _;
use std::sync::{Arc, Mutex, PoisonError};

use finbot::analytics::{Analytics, DEFAULT_ANALYTICS_PATH};
use finbot::chat::{ChatEvent, ChatSession, ProxyTransport, Sender};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const GREETING: &str = "Hi! I'm FinBot. Ask me about budgeting, saving, investing, or credit.";

type SharedAnalytics = Arc<Mutex<Analytics>>;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    // Logs go to stderr so they don't interleave with the conversation.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let transport = ProxyTransport::from_env().expect("failed to build proxy transport");
    tracing::info!(url = transport.url(), "finbot-chat: using proxy");

    let analytics_path = std::env::var("FINBOT_ANALYTICS_PATH").unwrap_or_else(|_| DEFAULT_ANALYTICS_PATH.into());
    let analytics: SharedAnalytics = Arc::new(Mutex::new(Analytics::load(analytics_path)));
    with_analytics(&analytics, |a| a.track_page_view("chatbot"));

    let (session, events) = ChatSession::start(Arc::new(transport));
    let renderer = tokio::spawn(render(events, analytics.clone()));

    println!("FinBot: {GREETING}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "finbot-chat: stdin read failed");
                break;
            }
        };
        let text = line.trim();
        match text {
            "" => continue,
            "/quit" => break,
            "/stats" => print_stats(&analytics),
            _ => {
                if let Err(e) = session.send(text).await {
                    tracing::warn!(error = %e, "finbot-chat: send rejected");
                }
            }
        }
    }

    // Dropping the session closes the event stream and ends the renderer.
    drop(session);
    if let Err(e) = renderer.await {
        tracing::warn!(error = %e, "finbot-chat: renderer task failed");
    }
    flush(&analytics).await;
}

async fn render(mut events: mpsc::UnboundedReceiver<ChatEvent>, analytics: SharedAnalytics) {
    let mut stdout = std::io::stdout();
    while let Some(event) = events.recv().await {
        match event {
            ChatEvent::TypingStarted => {
                print!("FinBot is typing...");
                stdout.flush().ok();
            }
            ChatEvent::TypingEnded => {
                print!("\r\x1b[2K");
                stdout.flush().ok();
            }
            // The terminal already shows what the user typed.
            ChatEvent::MessageReceived { text, sender: Sender::User, .. } => {
                with_analytics(&analytics, |a| {
                    a.track_interaction("chat_message", json!({ "sender": "user", "length": text.len() }));
                });
            }
            ChatEvent::MessageReceived { text, sender: Sender::Bot, transient } => {
                println!("FinBot: {text}");
                with_analytics(&analytics, |a| {
                    a.track_interaction(
                        "chat_message",
                        json!({ "sender": "bot", "length": text.len(), "failed": transient }),
                    );
                });
                // A failed turn ends here; no suggestions follow.
                if transient {
                    flush(&analytics).await;
                }
            }
            ChatEvent::SuggestionsAvailable(suggestions) => {
                if !suggestions.is_empty() {
                    println!("You might find these helpful:");
                    for s in &suggestions {
                        println!("  [{}] {}  {}", s.kind.as_str(), s.title, s.link);
                    }
                    let titles: Vec<&str> = suggestions.iter().map(|s| s.title).collect();
                    with_analytics(&analytics, |a| {
                        a.track_interaction("suggestions_shown", json!({ "titles": titles }));
                    });
                }
                flush(&analytics).await;
            }
        }
    }
}

fn print_stats(analytics: &SharedAnalytics) {
    with_analytics(analytics, |a| {
        println!("Page views: {}", a.total_page_views());
        println!("Article views: {}", a.total_article_views());
        for rank in a.most_used_tools(3) {
            println!("  tool {}: {}", rank.name, rank.usage);
        }
        println!("Recent interactions:");
        for interaction in a.recent_interactions(5) {
            println!("  {} at {}", interaction.kind, interaction.timestamp);
        }
    });
}

/// Serialize under the lock, then write on the blocking pool. Flushes are
/// awaited in order, so an older snapshot never lands after a newer one.
async fn flush(analytics: &SharedAnalytics) {
    let write = match with_analytics(analytics, |a| a.snapshot()) {
        Ok(Some(write)) => write,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(error = %e, "finbot-chat: analytics snapshot failed");
            return;
        }
    };
    let path = write.path().display().to_string();
    match tokio::task::spawn_blocking(move || write.write()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(%path, error = %e, "finbot-chat: analytics save failed"),
        Err(e) => tracing::warn!(%path, error = %e, "finbot-chat: analytics save task failed"),
    }
}

fn with_analytics<R>(analytics: &SharedAnalytics, f: impl FnOnce(&mut Analytics) -> R) -> R {
    let mut guard = analytics.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut guard)
}
