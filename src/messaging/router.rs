use super::EventKind;
use crate::connection::EventSink;
use crate::types::Envelope;
use std::sync::Arc;

/// What happened to one inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// Consumed internally (ping, pong, connection.ack)
    Control(EventKind),
    /// Handed to the event sink
    Dispatched,
    /// Could not be decoded and was dropped
    Dropped,
}

/// Decodes inbound frames and routes them to the control path or the sink
pub struct MessageRouter {
    sink: Arc<dyn EventSink>,
}

impl MessageRouter {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Routes a single text frame
    pub fn route(&self, text: &str) -> Routed {
        let envelope = match Envelope::decode(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("Dropping inbound frame: {} - Raw: {}", e, text);
                return Routed::Dropped;
            }
        };

        let kind = envelope.event();
        if kind.is_control() {
            tracing::debug!("Consumed control frame: {}", kind);
            return Routed::Control(kind);
        }

        tracing::debug!("Dispatching event {}", kind);
        self.sink.on_event(envelope);
        Routed::Dispatched
    }
}
