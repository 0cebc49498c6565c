//! The event value handed to handlers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::events::kind::EventKind;

/// A single pushed (or locally synthesized) event.
///
/// Serializes to the same `{uri, eventType, data}` shape the service pushes,
/// so handlers can forward it unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    uri: String,
    #[serde(rename = "eventType")]
    kind: EventKind,
    #[serde(rename = "data", default)]
    payload: Option<Value>,
}

impl Event {
    /// Create an event. A JSON `null` payload is stored as absent.
    pub fn new(uri: impl Into<String>, kind: EventKind, payload: Option<Value>) -> Self {
        Self {
            uri: uri.into(),
            kind,
            payload: payload.filter(|value| !value.is_null()),
        }
    }

    /// Create a payload-less event used to signal lifecycle milestones.
    pub fn synthetic(uri: impl Into<String>, kind: EventKind) -> Self {
        Self::new(uri, kind, None)
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    /// Deserialize the payload into a typed value.
    ///
    /// Returns `None` when the event carries no payload.
    pub fn payload_as<T: serde::de::DeserializeOwned>(&self) -> Option<serde_json::Result<T>> {
        self.payload.clone().map(serde_json::from_value)
    }
}
