//! Transport layer (WebSocket client).
//!
//! Builds the socket URL from the login result, decodes frames once before
//! they reach the dispatcher, and drives one connection until it closes.

pub mod codec;
pub mod url;
pub mod ws;

pub use url::ws_url;
pub use ws::{CloseReason, ConnectionParams};
