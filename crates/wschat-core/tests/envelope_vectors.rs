//! Envelope decode vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use chrono::{DateTime, Utc};

use wschat_core::protocol::Envelope;
use wschat_core::{Event, EventKind};

use vector_loader::{error_code, load};

#[test]
fn envelope_vectors() {
    let files = [
        "send_message.json",
        "new_message_millis.json",
        "new_message_rfc3339.json",
        "new_message_no_sent.json",
        "missing_type.json",
        "empty_type.json",
        "unknown_type.json",
        "missing_from.json",
        "missing_payload.json",
        "payload_not_object.json",
        "bad_sent.json",
        "extra_top_level.json",
        "not_json.json",
    ];

    for f in files {
        let v = load(f);
        let res = Event::decode(&v.frame);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(error_code(&e), err.code, "vector={}", v.description);
            continue;
        }

        let event = res.expect("expected ok event");
        let ex = v.expect.expect("missing expect block");

        assert_eq!(event.kind().as_str(), ex["kind"].as_str().unwrap(), "vector={}", v.description);
        match event {
            Event::SendMessage(p) => {
                assert_eq!(p.message, ex["message"].as_str().unwrap(), "vector={}", v.description);
                assert_eq!(p.from, ex["from"].as_str().unwrap(), "vector={}", v.description);
            }
            Event::NewMessage(p) => {
                assert_eq!(p.message, ex["message"].as_str().unwrap(), "vector={}", v.description);
                assert_eq!(p.from, ex["from"].as_str().unwrap(), "vector={}", v.description);
                match ex["sent"].as_str() {
                    Some(s) => {
                        let want = DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc);
                        assert_eq!(p.sent, Some(want), "vector={}", v.description);
                    }
                    None => assert!(p.sent.is_none(), "vector={}", v.description),
                }
            }
        }
    }
}

#[test]
fn raw_envelope_keeps_payload_unparsed() {
    let s = load("send_message.json").frame;
    let env: Envelope = serde_json::from_str(&s).unwrap();
    assert_eq!(env.kind.as_deref(), Some("send message"));
    let raw = env.payload.unwrap();
    assert!(raw.get().contains("\"garrett\""));
}

#[test]
fn unknown_type_keeps_name() {
    let err = Event::decode(&load("unknown_type.json").frame).unwrap_err();
    assert_eq!(err, wschat_core::DecodeError::UnknownType("typing".into()));
}

#[test]
fn kind_names_round_trip() {
    for k in EventKind::ALL {
        assert_eq!(EventKind::parse(k.as_str()), Some(k));
    }
    assert_eq!(EventKind::parse("default"), None);
}
