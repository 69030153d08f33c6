//! Chat event protocol.
//!
//! Every WebSocket text frame is one JSON envelope `{"type": ..., "payload": ...}`:
//! - `envelope`: the wire shape, with the payload kept raw until the type is known.
//! - `event`: the closed set of typed events and the validating decoder.
//!
//! Decoding never panics. A frame that does not name a known type, or whose
//! payload lacks required fields, is reported as a `DecodeError`.

pub mod envelope;
pub mod event;

pub use envelope::{Envelope, OutgoingEnvelope};
pub use event::{DecodeError, Event, EventKind, NewMessageEvent, SendMessageEvent};
