use crate::types::Envelope;
use crate::types::constants::event_types;
use crate::types::error::ConnectionError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type-safe envelope kinds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Server acknowledged the connection
    ConnectionAck,

    /// Keepalive request
    Ping,

    /// Keepalive reply
    Pong,

    /// Chat events
    MessageCreated,
    MessageUpdated,
    MessageDeleted,

    /// Presence change for one user
    UserStatusChanged,

    /// Anything this client does not know about yet
    Custom(String),
}

impl EventKind {
    /// Parse an envelope `type` string
    pub fn from_str(s: &str) -> Self {
        match s {
            event_types::CONNECTION_ACK => Self::ConnectionAck,
            event_types::PING => Self::Ping,
            event_types::PONG => Self::Pong,
            event_types::MESSAGE_CREATED => Self::MessageCreated,
            event_types::MESSAGE_UPDATED => Self::MessageUpdated,
            event_types::MESSAGE_DELETED => Self::MessageDeleted,
            event_types::USER_STATUS_CHANGED => Self::UserStatusChanged,
            _ => Self::Custom(s.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ConnectionAck => event_types::CONNECTION_ACK,
            Self::Ping => event_types::PING,
            Self::Pong => event_types::PONG,
            Self::MessageCreated => event_types::MESSAGE_CREATED,
            Self::MessageUpdated => event_types::MESSAGE_UPDATED,
            Self::MessageDeleted => event_types::MESSAGE_DELETED,
            Self::UserStatusChanged => event_types::USER_STATUS_CHANGED,
            Self::Custom(s) => s,
        }
    }

    /// Protocol-internal kinds that never reach the event sink
    pub fn is_control(&self) -> bool {
        matches!(self, Self::ConnectionAck | Self::Ping | Self::Pong)
    }
}

impl From<&str> for EventKind {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User identifiers arrive as numbers from some backends and strings from others.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Int(i64),
    Str(String),
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{}", id),
            Self::Str(id) => write!(f, "{}", id),
        }
    }
}

/// Payload of `user.status.changed`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStatusChange {
    pub user_id: UserId,
    pub is_online: bool,
}

/// Application-level view of a forwarded envelope.
///
/// Chat payloads stay opaque; consumers must treat repeated
/// `MessageUpdated` events for the same message as idempotent.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    MessageCreated(Value),
    MessageUpdated(Value),
    MessageDeleted(Value),
    UserStatusChanged(UserStatusChange),
    Other(Envelope),
}

impl DomainEvent {
    pub fn from_envelope(envelope: Envelope) -> Result<Self, ConnectionError> {
        let event = match envelope.event() {
            EventKind::MessageCreated => Self::MessageCreated(envelope.payload),
            EventKind::MessageUpdated => Self::MessageUpdated(envelope.payload),
            EventKind::MessageDeleted => Self::MessageDeleted(envelope.payload),
            EventKind::UserStatusChanged => {
                let change = serde_json::from_value::<UserStatusChange>(envelope.payload)
                    .map_err(|e| ConnectionError::MalformedFrame(e.to_string()))?;
                Self::UserStatusChanged(change)
            }
            _ => Self::Other(envelope),
        };
        Ok(event)
    }
}
