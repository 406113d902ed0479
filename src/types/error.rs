use thiserror::Error;

/// Errors returned from fallible calls on the public API.
#[derive(Error, Debug)]
pub enum RealtimeError {
    /// WebSocket protocol error (handshake failed, invalid frame, etc.)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// General connection error with descriptive message
    #[error("Connection error: {0}")]
    Connection(String),

    /// The endpoint builder could not produce a URL
    #[error("Endpoint error: {0}")]
    Endpoint(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing error (malformed API base or endpoint)
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Attempted a send while the transport was not open
    #[error("Not connected")]
    NotConnected,
}

/// Convenience type alias for `Result<T, RealtimeError>`.
pub type Result<T> = std::result::Result<T, RealtimeError>;

/// Failures observed while a subscription is live.
///
/// These never cross the API boundary as `Err`; they are classified locally and
/// handed to [`EventSink::on_error`](crate::EventSink::on_error) when they
/// warrant the consumer's attention.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// An inbound frame was not a JSON object with a string `type`.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// The server closed the connection with a protocol-level code.
    #[error("Transport closed with code {code}: {reason}")]
    TransportError { code: u16, reason: String },

    /// Automatic reconnection gave up.
    #[error("Gave up reconnecting after {attempts} attempts")]
    RetryExhausted { attempts: u32 },

    /// No identity or token was available when connecting.
    #[error("Not authenticated")]
    Unauthenticated,
}

impl ConnectionError {
    /// Whether no further automatic action follows this error.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RetryExhausted { .. })
    }

    /// Short text suitable for a non-blocking notice in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::RetryExhausted { .. } | Self::TransportError { .. } => {
                "Live features are temporarily unavailable"
            }
            Self::MalformedFrame(_) | Self::Unauthenticated => "",
        }
    }
}

/// Snapshot of the last error recorded in connection state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub error: ConnectionError,
    pub at: std::time::SystemTime,
}

impl ErrorInfo {
    pub fn new(error: ConnectionError) -> Self {
        Self {
            error,
            at: std::time::SystemTime::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_exhaustion_is_terminal() {
        assert!(ConnectionError::RetryExhausted { attempts: 5 }.is_terminal());
        assert!(
            !ConnectionError::TransportError {
                code: 4001,
                reason: "bad".to_string()
            }
            .is_terminal()
        );
        assert!(!ConnectionError::Unauthenticated.is_terminal());
    }

    #[test]
    fn test_user_message_is_never_fatal_wording() {
        let msg = ConnectionError::RetryExhausted { attempts: 5 }.user_message();
        assert_eq!(msg, "Live features are temporarily unavailable");
        assert!(ConnectionError::MalformedFrame("x".into()).user_message().is_empty());
    }

    #[test]
    fn test_error_display() {
        let err = ConnectionError::TransportError {
            code: 4003,
            reason: "forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "Transport closed with code 4003: forbidden");
    }
}
