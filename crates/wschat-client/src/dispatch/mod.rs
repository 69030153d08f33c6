//! Dispatcher module exports.
//!
//! Re-exports the dispatcher, handler traits, and built-in handlers so
//! downstream consumers can depend on this module directly.

pub mod dispatcher;
pub mod handlers;

pub use dispatcher::{Dispatcher, DispatcherBuilder, EventHandler, FallbackHandler, Route, Unroutable};
pub use handlers::{format_line, LogUnroutable, NewMessageHandler};
