//! Decode-once codec for the transport layer.
//!
//! - Text frames => `Event` (or the `DecodeError` that explains why not)
//! - Binary frames are not part of the chat protocol and are surfaced as such
//! - Ping/Pong/Close are surfaced for lifecycle management

use tokio_tungstenite::tungstenite::Message;
use wschat_core::{
    error::Result,
    protocol::{DecodeError, Event},
};

#[derive(Debug)]
pub enum Inbound {
    Event {
        decoded: std::result::Result<Event, DecodeError>,
        bytes_len: usize,
    },
    Binary { bytes_len: usize },
    Ping,
    Pong,
    Close,
    /// Raw frames; never yielded while reading.
    Ignored,
}

/// Decode one inbound message. Text frames over `max_frame_bytes` are not parsed.
pub fn decode(msg: Message, max_frame_bytes: usize) -> Inbound {
    match msg {
        Message::Text(s) => {
            let bytes_len = s.len();
            Inbound::Event {
                decoded: decode_text(s.as_str(), max_frame_bytes),
                bytes_len,
            }
        }
        Message::Binary(b) => Inbound::Binary { bytes_len: b.len() },
        Message::Ping(_) => Inbound::Ping,
        Message::Pong(_) => Inbound::Pong,
        Message::Close(_) => Inbound::Close,
        Message::Frame(_) => Inbound::Ignored,
    }
}

pub fn decode_text(text: &str, max_frame_bytes: usize) -> std::result::Result<Event, DecodeError> {
    if text.len() > max_frame_bytes {
        return Err(DecodeError::FrameTooLarge {
            len: text.len(),
            max: max_frame_bytes,
        });
    }
    Event::decode(text)
}

/// Encode an event as a text frame.
pub fn encode(event: &Event) -> Result<Message> {
    Ok(Message::text(event.encode()?))
}
