//! Transport seam between the connection state machine and the socket.
//!
//! The manager only ever sees [`TransportEvent`]s and talks back through a
//! [`FrameSink`], so the production WebSocket and the scripted test transport
//! are interchangeable.

#[cfg(test)]
pub(crate) mod mock;
mod websocket;

pub use websocket::TungsteniteConnector;

use crate::types::constants::{WS_CLOSE_ABNORMAL, WS_CLOSE_GOING_AWAY, WS_CLOSE_NORMAL};
use crate::types::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use url::Url;

/// Everything the transport can report to the connection manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed
    Open,
    /// One inbound text frame
    Frame(String),
    /// Transport-level error; a `Closed` event always follows
    Error(String),
    /// The link is gone
    Closed { code: u16, reason: String },
}

impl TransportEvent {
    pub fn closed(code: u16, reason: impl Into<String>) -> Self {
        Self::Closed {
            code,
            reason: reason.into(),
        }
    }

    pub fn abnormal(reason: impl Into<String>) -> Self {
        Self::closed(WS_CLOSE_ABNORMAL, reason)
    }
}

/// How a close code is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseKind {
    /// 1000/1001: no error, no retry
    Expected,
    /// 1006: flaky network, retried quietly
    Retryable,
    /// Anything else: surfaced to the consumer
    Protocol,
}

impl CloseKind {
    pub fn classify(code: u16) -> Self {
        match code {
            WS_CLOSE_NORMAL | WS_CLOSE_GOING_AWAY => Self::Expected,
            WS_CLOSE_ABNORMAL => Self::Retryable,
            _ => Self::Protocol,
        }
    }
}

/// An established link: an outbound sink plus the inbound event stream
pub struct Transport {
    pub sink: Box<dyn FrameSink>,
    pub events: BoxStream<'static, TransportEvent>,
}

/// Opens transport links
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &Url) -> Result<Transport>;
}

/// Outbound half of a link
#[async_trait]
pub trait FrameSink: Send + 'static {
    async fn send_text(&mut self, text: String) -> Result<()>;

    async fn close(&mut self, code: u16, reason: &str) -> Result<()>;
}
