use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use wschat_core::error::Result;
use wschat_core::protocol::{DecodeError, Event, EventKind};

use crate::dispatch::handlers::LogUnroutable;
use crate::transport::codec;

/// Handler for one event kind.
#[async_trait]
pub trait EventHandler: Send + Sync {
    fn kind(&self) -> EventKind;
    async fn handle(&self, event: Event) -> Result<()>;
}

/// Why a frame reached the fallback handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unroutable {
    /// The frame did not decode into a known event.
    Undecodable(DecodeError),
    /// The event decoded but no handler is registered for its kind.
    Unhandled(EventKind),
}

/// Handler for every frame no registered handler takes.
#[async_trait]
pub trait FallbackHandler: Send + Sync {
    async fn handle(&self, reason: Unroutable);
}

/// Which handler a frame was routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Handler(EventKind),
    Fallback,
}

/// Immutable kind -> handler table, built once by `DispatcherBuilder`.
///
/// Exactly one handler runs per frame: the one registered for the event's
/// kind, or the fallback.
pub struct Dispatcher {
    handlers: HashMap<EventKind, Arc<dyn EventHandler>>,
    fallback: Arc<dyn FallbackHandler>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    pub fn registered_kinds(&self) -> Vec<EventKind> {
        EventKind::ALL
            .into_iter()
            .filter(|k| self.handlers.contains_key(k))
            .collect()
    }

    /// Route a decoded frame. Handler errors are returned after the handler ran.
    pub async fn dispatch(&self, decoded: std::result::Result<Event, DecodeError>) -> Result<Route> {
        let event = match decoded {
            Ok(event) => event,
            Err(e) => {
                self.fallback.handle(Unroutable::Undecodable(e)).await;
                return Ok(Route::Fallback);
            }
        };

        let kind = event.kind();
        match self.handlers.get(&kind) {
            Some(handler) => {
                handler.handle(event).await?;
                Ok(Route::Handler(kind))
            }
            None => {
                self.fallback.handle(Unroutable::Unhandled(kind)).await;
                Ok(Route::Fallback)
            }
        }
    }

    /// Decode a text frame and route it.
    pub async fn dispatch_text(&self, text: &str, max_frame_bytes: usize) -> Result<Route> {
        self.dispatch(codec::decode_text(text, max_frame_bytes)).await
    }
}

#[derive(Default)]
pub struct DispatcherBuilder {
    handlers: HashMap<EventKind, Arc<dyn EventHandler>>,
    fallback: Option<Arc<dyn FallbackHandler>>,
}

impl DispatcherBuilder {
    /// Register a handler under its kind. A later registration for the same kind replaces the earlier one.
    pub fn register(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let kind = handler.kind();
        if self.handlers.insert(kind, handler).is_some() {
            tracing::warn!(%kind, "event handler replaced");
        }
        self
    }

    pub fn fallback(mut self, handler: Arc<dyn FallbackHandler>) -> Self {
        self.fallback = Some(handler);
        self
    }

    /// Freeze the table. Without an explicit fallback, unroutable frames are logged.
    pub fn build(self) -> Dispatcher {
        Dispatcher {
            handlers: self.handlers,
            fallback: self.fallback.unwrap_or_else(|| Arc::new(LogUnroutable)),
        }
    }
}
