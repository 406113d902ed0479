use crate::types::{ConnectionError, Envelope};
use tokio::sync::mpsc;

/// Receives everything a subscription produces for its consumer.
///
/// Callbacks run on the connection's reader or timer task and must not block.
pub trait EventSink: Send + Sync + 'static {
    /// A non-control envelope, in transport order
    fn on_event(&self, envelope: Envelope);

    /// The transport opened
    fn on_connect(&self) {}

    /// A genuine transport error or exhausted retries
    fn on_error(&self, _error: ConnectionError) {}
}

/// Sink events as delivered through a [`ChannelSink`]
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Connected,
    Event(Envelope),
    Error(ConnectionError),
}

/// Forwards sink callbacks into an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SinkEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: SinkEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("Sink receiver dropped, discarding event");
        }
    }
}

impl EventSink for ChannelSink {
    fn on_event(&self, envelope: Envelope) {
        self.forward(SinkEvent::Event(envelope));
    }

    fn on_connect(&self) {
        self.forward(SinkEvent::Connected);
    }

    fn on_error(&self, error: ConnectionError) {
        self.forward(SinkEvent::Error(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_forwards_in_order() {
        let (sink, mut rx) = ChannelSink::new();
        sink.on_connect();
        sink.on_event(Envelope::control("message.created"));
        sink.on_error(ConnectionError::RetryExhausted { attempts: 5 });

        assert_eq!(rx.try_recv().unwrap(), SinkEvent::Connected);
        assert!(matches!(rx.try_recv().unwrap(), SinkEvent::Event(_)));
        assert_eq!(
            rx.try_recv().unwrap(),
            SinkEvent::Error(ConnectionError::RetryExhausted { attempts: 5 })
        );
    }

    #[test]
    fn test_default_callbacks_are_noops() {
        struct EventsOnly(std::sync::Mutex<Vec<String>>);

        impl EventSink for EventsOnly {
            fn on_event(&self, envelope: Envelope) {
                self.0.lock().unwrap().push(envelope.kind);
            }
        }

        let sink = EventsOnly(std::sync::Mutex::new(Vec::new()));
        sink.on_connect();
        sink.on_error(ConnectionError::Unauthenticated);
        sink.on_event(Envelope::control("message.deleted"));
        assert_eq!(*sink.0.lock().unwrap(), vec!["message.deleted"]);
    }

    #[test]
    fn test_dropped_receiver_is_ignored() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        sink.on_connect();
    }
}
