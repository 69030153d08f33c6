//! Envelope wire shape (JSON).
//!
//! Inbound envelopes keep `payload` as `RawValue` so the payload is parsed once,
//! after the event type has been resolved.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// Inbound envelope (Text frame).
///
/// Both fields are optional at this layer so that a missing `type` can be
/// reported precisely by the event decoder instead of as a generic JSON error.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    /// Event type name (field name is `type` in JSON).
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Event payload, stored as raw JSON (lazy parsing).
    #[serde(default)]
    pub payload: Option<Box<RawValue>>,
}

/// Outbound envelope, borrowed from a typed payload.
#[derive(Debug, Serialize)]
pub struct OutgoingEnvelope<'a, T: Serialize> {
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub payload: &'a T,
}
