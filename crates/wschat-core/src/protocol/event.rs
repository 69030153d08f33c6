//! Typed chat events and the validating envelope decoder.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use thiserror::Error;

use crate::error::{ChatError, Result};
use crate::protocol::envelope::{Envelope, OutgoingEnvelope};

/// Closed set of event types carried in the envelope `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Client -> server: a chat message submitted by this user.
    SendMessage,
    /// Server -> client: a chat message broadcast to the room.
    NewMessage,
}

impl EventKind {
    /// Every known kind.
    pub const ALL: [EventKind; 2] = [EventKind::SendMessage, EventKind::NewMessage];

    /// Wire name used in the envelope `type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::SendMessage => "send message",
            EventKind::NewMessage => "new message",
        }
    }

    /// Resolve a wire name. Returns `None` for names outside the closed set.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an inbound frame could not be turned into an `Event`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed envelope: {0}")]
    Malformed(String),
    #[error("envelope has no type")]
    MissingType,
    #[error("unsupported event type: {0}")]
    UnknownType(String),
    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload { kind: EventKind, reason: String },
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge { len: usize, max: usize },
}

/// Outbound chat message payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageEvent {
    pub message: String,
    pub from: String,
}

impl SendMessageEvent {
    pub fn new(message: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            from: from.into(),
        }
    }
}

/// Inbound chat message payload: the sent message plus the server send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessageEvent {
    pub message: String,
    pub from: String,
    /// Server-assigned send time. Accepts epoch milliseconds or RFC 3339.
    #[serde(
        default,
        with = "sent_time",
        skip_serializing_if = "Option::is_none"
    )]
    pub sent: Option<DateTime<Utc>>,
}

impl NewMessageEvent {
    pub fn new(message: impl Into<String>, from: impl Into<String>, sent: DateTime<Utc>) -> Self {
        Self {
            message: message.into(),
            from: from.into(),
            sent: Some(sent),
        }
    }
}

/// A decoded chat event (tagged by `EventKind`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SendMessage(SendMessageEvent),
    NewMessage(NewMessageEvent),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::SendMessage(_) => EventKind::SendMessage,
            Event::NewMessage(_) => EventKind::NewMessage,
        }
    }

    /// Decode one text frame.
    pub fn decode(text: &str) -> std::result::Result<Self, DecodeError> {
        let env: Envelope =
            serde_json::from_str(text).map_err(|e| DecodeError::Malformed(e.to_string()))?;
        Self::from_envelope(env)
    }

    /// Resolve the type, then parse the payload into that type's shape.
    pub fn from_envelope(env: Envelope) -> std::result::Result<Self, DecodeError> {
        let name = env
            .kind
            .filter(|k| !k.is_empty())
            .ok_or(DecodeError::MissingType)?;
        let kind = EventKind::parse(&name).ok_or(DecodeError::UnknownType(name))?;
        let raw = env.payload.ok_or_else(|| DecodeError::InvalidPayload {
            kind,
            reason: "missing payload".into(),
        })?;

        match kind {
            EventKind::SendMessage => parse_payload(kind, &raw).map(Event::SendMessage),
            EventKind::NewMessage => parse_payload(kind, &raw).map(Event::NewMessage),
        }
    }

    /// Serialize to a `{type, payload}` JSON text frame.
    pub fn encode(&self) -> Result<String> {
        let kind = self.kind().as_str();
        let encoded = match self {
            Event::SendMessage(p) => serde_json::to_string(&OutgoingEnvelope { kind, payload: p }),
            Event::NewMessage(p) => serde_json::to_string(&OutgoingEnvelope { kind, payload: p }),
        };
        encoded.map_err(|e| ChatError::Internal(format!("json encode failed: {e}")))
    }
}

impl From<SendMessageEvent> for Event {
    fn from(p: SendMessageEvent) -> Self {
        Event::SendMessage(p)
    }
}

impl From<NewMessageEvent> for Event {
    fn from(p: NewMessageEvent) -> Self {
        Event::NewMessage(p)
    }
}

fn parse_payload<T: DeserializeOwned>(
    kind: EventKind,
    raw: &RawValue,
) -> std::result::Result<T, DecodeError> {
    if !raw.get().trim_start().starts_with('{') {
        return Err(DecodeError::InvalidPayload {
            kind,
            reason: "payload must be an object".into(),
        });
    }
    serde_json::from_str(raw.get()).map_err(|e| DecodeError::InvalidPayload {
        kind,
        reason: e.to_string(),
    })
}

mod sent_time {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Millis(i64),
        Rfc3339(String),
    }

    pub fn serialize<S: Serializer>(
        sent: &Option<DateTime<Utc>>,
        s: S,
    ) -> Result<S::Ok, S::Error> {
        match sent {
            Some(t) => s.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Millis, true)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<Wire>::deserialize(d)? {
            None => Ok(None),
            Some(Wire::Millis(ms)) => DateTime::from_timestamp_millis(ms)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("sent out of range: {ms}"))),
            Some(Wire::Rfc3339(s)) => DateTime::parse_from_rfc3339(&s)
                .map(|t| Some(t.with_timezone(&Utc)))
                .map_err(de::Error::custom),
        }
    }
}
