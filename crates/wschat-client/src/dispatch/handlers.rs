use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use wschat_core::error::Result;
use wschat_core::protocol::{Event, EventKind, NewMessageEvent};

use crate::dispatch::dispatcher::{EventHandler, FallbackHandler, Unroutable};
use crate::view::ChatView;

const SENT_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Renders `"new message"` events into the message log.
pub struct NewMessageHandler {
    view: Arc<ChatView>,
}

impl NewMessageHandler {
    pub fn new(view: Arc<ChatView>) -> Self {
        Self { view }
    }
}

#[async_trait]
impl EventHandler for NewMessageHandler {
    fn kind(&self) -> EventKind {
        EventKind::NewMessage
    }

    async fn handle(&self, event: Event) -> Result<()> {
        match event {
            Event::NewMessage(msg) => {
                self.view.append_message(format_line(&msg, Utc::now()));
            }
            other => {
                tracing::warn!(kind = %other.kind(), "new message handler got another kind");
            }
        }
        Ok(())
    }
}

/// `"<sent> <from>: <message>"`; a missing send time falls back to `received_at`.
pub fn format_line(msg: &NewMessageEvent, received_at: DateTime<Utc>) -> String {
    let sent = msg.sent.unwrap_or(received_at);
    format!("{} {}: {}", sent.format(SENT_FORMAT), msg.from, msg.message)
}

/// Default fallback: log and drop.
pub struct LogUnroutable;

#[async_trait]
impl FallbackHandler for LogUnroutable {
    async fn handle(&self, reason: Unroutable) {
        match reason {
            Unroutable::Undecodable(e) => tracing::warn!(error = %e, "unsupported event"),
            Unroutable::Unhandled(kind) => tracing::warn!(%kind, "no handler for event"),
        }
    }
}
