//! Scripted transport for driving the connection manager in tests.

use super::{Connector, FrameSink, Transport, TransportEvent};
use crate::types::RealtimeError;
use crate::types::error::Result;
use async_trait::async_trait;
use futures::StreamExt;
use futures::channel::mpsc::{UnboundedSender, unbounded};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;
use url::Url;

#[derive(Default)]
struct Script {
    urls: Vec<String>,
    connect_times: Vec<Instant>,
    refuse_next: usize,
    links: Vec<UnboundedSender<TransportEvent>>,
    sent: Vec<(usize, String)>,
    closes: Vec<(usize, u16)>,
}

/// Connector whose links are fed by the test
#[derive(Clone, Default)]
pub(crate) struct ScriptedConnector {
    script: Arc<Mutex<Script>>,
}

impl ScriptedConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` connect calls fail the handshake
    pub fn refuse_next(&self, n: usize) {
        self.script.lock().unwrap().refuse_next = n;
    }

    pub fn connect_count(&self) -> usize {
        self.script.lock().unwrap().connect_times.len()
    }

    pub fn connect_times(&self) -> Vec<Instant> {
        self.script.lock().unwrap().connect_times.clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.script.lock().unwrap().urls.clone()
    }

    pub fn link_count(&self) -> usize {
        self.script.lock().unwrap().links.len()
    }

    /// Index of the most recently opened link
    pub fn latest(&self) -> usize {
        self.link_count().saturating_sub(1)
    }

    pub fn sent(&self) -> Vec<String> {
        let script = self.script.lock().unwrap();
        script.sent.iter().map(|(_, text)| text.clone()).collect()
    }

    pub fn ping_count(&self) -> usize {
        self.sent()
            .iter()
            .filter(|text| text.as_str() == r#"{"type":"ping"}"#)
            .count()
    }

    pub fn closes(&self) -> Vec<(usize, u16)> {
        self.script.lock().unwrap().closes.clone()
    }

    /// Push an event into a link; false if the reader is gone
    pub fn push(&self, link: usize, event: TransportEvent) -> bool {
        let script = self.script.lock().unwrap();
        match script.links.get(link) {
            Some(tx) => tx.unbounded_send(event).is_ok(),
            None => false,
        }
    }

    pub fn frame(&self, link: usize, text: &str) -> bool {
        self.push(link, TransportEvent::Frame(text.to_string()))
    }

    pub fn close(&self, link: usize, code: u16) -> bool {
        self.push(link, TransportEvent::closed(code, "scripted"))
    }

    /// End the inbound stream without a close event
    pub fn drop_link(&self, link: usize) {
        let script = self.script.lock().unwrap();
        if let Some(tx) = script.links.get(link) {
            tx.close_channel();
        }
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, url: &Url) -> Result<Transport> {
        let mut script = self.script.lock().unwrap();
        script.urls.push(url.to_string());
        script.connect_times.push(Instant::now());

        if script.refuse_next > 0 {
            script.refuse_next -= 1;
            return Err(RealtimeError::Connection("connection refused".to_string()));
        }

        let (tx, rx) = unbounded();
        let link = script.links.len();
        script.links.push(tx);

        Ok(Transport {
            sink: Box::new(ScriptedSink {
                link,
                script: Arc::clone(&self.script),
            }),
            events: rx.boxed(),
        })
    }
}

struct ScriptedSink {
    link: usize,
    script: Arc<Mutex<Script>>,
}

#[async_trait]
impl FrameSink for ScriptedSink {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.script.lock().unwrap().sent.push((self.link, text));
        Ok(())
    }

    async fn close(&mut self, code: u16, _reason: &str) -> Result<()> {
        self.script.lock().unwrap().closes.push((self.link, code));
        Ok(())
    }
}
