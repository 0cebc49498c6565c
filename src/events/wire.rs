//! Wire envelope codec for the event channel.
//!
//! Inbound frames are JSON arrays `[eventCode, subscriptionName, eventBody]`
//! where `eventBody = {uri, eventType, data?}`. Outbound control frames are
//! `[eventCode, subscriptionName]`.

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::events::event::Event;
use crate::events::kind::{EventKind, ParseKindError};

/// Message codes of the event channel protocol.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCode {
    Welcome = 0,
    Prefix = 1,
    Call = 2,
    CallResult = 3,
    CallError = 4,
    Subscribe = 5,
    Unsubscribe = 6,
    Publish = 7,
    Event = 8,
}

impl TryFrom<u64> for EventCode {
    type Error = FrameError;

    fn try_from(code: u64) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => EventCode::Welcome,
            1 => EventCode::Prefix,
            2 => EventCode::Call,
            3 => EventCode::CallResult,
            4 => EventCode::CallError,
            5 => EventCode::Subscribe,
            6 => EventCode::Unsubscribe,
            7 => EventCode::Publish,
            8 => EventCode::Event,
            other => return Err(FrameError::UnknownCode(other)),
        })
    }
}

/// Errors produced while decoding an inbound frame.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("frame is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed envelope: {0}")]
    Shape(&'static str),

    #[error("unknown event code {0}")]
    UnknownCode(u64),

    #[error("invalid event body: {0}")]
    Kind(#[from] ParseKindError),
}

#[derive(Deserialize)]
struct EventBody {
    uri: String,
    #[serde(rename = "eventType")]
    event_type: String,
    #[serde(default)]
    data: Option<Value>,
}

/// Frame asking the service to start publishing `subscription`.
pub fn subscribe_frame(subscription: &str) -> String {
    json!([EventCode::Subscribe as u8, subscription]).to_string()
}

/// Frame asking the service to stop publishing `subscription`.
pub fn unsubscribe_frame(subscription: &str) -> String {
    json!([EventCode::Unsubscribe as u8, subscription]).to_string()
}

/// Decode one inbound text frame.
///
/// Returns `Ok(None)` for well-formed envelopes that carry no event
/// (welcome, call results, ...).
pub fn decode_frame(text: &str) -> Result<Option<Event>, FrameError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(mut items) = value else {
        return Err(FrameError::Shape("expected a JSON array"));
    };

    let code = items
        .first()
        .and_then(Value::as_u64)
        .ok_or(FrameError::Shape("missing numeric event code"))?;
    if EventCode::try_from(code)? != EventCode::Event {
        return Ok(None);
    }
    if items.len() < 3 {
        return Err(FrameError::Shape("event envelope needs three elements"));
    }

    let body: EventBody = serde_json::from_value(items.swap_remove(2))?;
    let kind: EventKind = body.event_type.parse()?;
    Ok(Some(Event::new(body.uri, kind, body.data)))
}
