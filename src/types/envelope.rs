use crate::messaging::EventKind;
use crate::types::constants::event_types;
use crate::types::error::{ConnectionError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single decoded frame: a `type` discriminator plus an opaque payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub payload: Value,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// An envelope with no payload, e.g. `{"type":"ping"}`.
    pub fn control(kind: impl Into<String>) -> Self {
        Self::new(kind, Value::Null)
    }

    pub fn ping() -> Self {
        Self::control(event_types::PING)
    }

    pub fn event(&self) -> EventKind {
        EventKind::from_str(&self.kind)
    }

    /// Decodes one text frame.
    ///
    /// The frame must be a JSON object with a string `type`. If the only other
    /// field is `payload`, its value becomes the payload; otherwise the remaining
    /// fields (including any `payload`) are kept together as an object.
    pub fn decode(text: &str) -> std::result::Result<Self, ConnectionError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ConnectionError::MalformedFrame(e.to_string()))?;

        let Value::Object(mut fields) = value else {
            return Err(ConnectionError::MalformedFrame(
                "frame is not a JSON object".to_string(),
            ));
        };

        let kind = match fields.remove("type") {
            Some(Value::String(kind)) => kind,
            _ => {
                return Err(ConnectionError::MalformedFrame(
                    "frame has no string `type`".to_string(),
                ));
            }
        };

        Ok(Self::new(kind, Self::collect_payload(fields)))
    }

    fn collect_payload(mut fields: Map<String, Value>) -> Value {
        match fields.remove("payload") {
            Some(payload) if fields.is_empty() => payload,
            Some(payload) => {
                fields.insert("payload".to_string(), payload);
                Value::Object(fields)
            }
            None if fields.is_empty() => Value::Null,
            None => Value::Object(fields),
        }
    }

    /// Serializes the envelope for an outbound text frame.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
