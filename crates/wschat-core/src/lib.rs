//! wschat core: transport-agnostic event envelope and error types.
//!
//! This crate defines the wire contract exchanged over the chat WebSocket
//! (the `{type, payload}` envelope and its typed events) and the error surface
//! shared by the client crate. It carries no transport or runtime
//! dependencies so it can be reused by other front ends or test tooling.
//!
//! # Panic-free decoding
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed frames surface as `DecodeError`, everything else as `ChatError`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ChatError, ErrorCode, Result};
pub use protocol::{DecodeError, Event, EventKind, NewMessageEvent, SendMessageEvent};
