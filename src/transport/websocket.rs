use super::{Connector, FrameSink, Transport, TransportEvent};
use crate::types::error::Result;
use async_trait::async_trait;
use futures::stream::{self, SplitSink};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Close code reported when the server sends a close frame without a status
const WS_CLOSE_NO_STATUS: u16 = 1005;

/// Opens real WebSocket links with tokio-tungstenite
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &Url) -> Result<Transport> {
        tracing::debug!("Opening WebSocket to {}{}", url.host_str().unwrap_or(""), url.path());
        let (ws_stream, _response) = connect_async(url.as_str()).await?;
        let (write_half, read_half) = ws_stream.split();

        let events = read_half
            .flat_map(|msg| stream::iter(translate(msg)))
            .boxed();

        Ok(Transport {
            sink: Box::new(TungsteniteSink { write: write_half }),
            events,
        })
    }
}

fn translate(
    msg: std::result::Result<Message, tokio_tungstenite::tungstenite::Error>,
) -> Vec<TransportEvent> {
    match msg {
        Ok(Message::Text(text)) => vec![TransportEvent::Frame(text.to_string())],
        Ok(Message::Close(frame)) => match frame {
            Some(close_frame) => vec![TransportEvent::closed(
                u16::from(close_frame.code),
                close_frame.reason.to_string(),
            )],
            None => vec![TransportEvent::closed(WS_CLOSE_NO_STATUS, "")],
        },
        Ok(Message::Ping(data)) => {
            tracing::trace!("Received transport ping ({} bytes)", data.len());
            Vec::new()
        }
        Ok(Message::Pong(data)) => {
            tracing::trace!("Received transport pong ({} bytes)", data.len());
            Vec::new()
        }
        Ok(Message::Binary(data)) => {
            tracing::debug!("Ignoring binary frame ({} bytes)", data.len());
            Vec::new()
        }
        Ok(Message::Frame(_)) => Vec::new(),
        Err(e) => vec![
            TransportEvent::Error(e.to_string()),
            TransportEvent::abnormal(e.to_string()),
        ],
    }
}

struct TungsteniteSink {
    write: WsWriter,
}

#[async_trait]
impl FrameSink for TungsteniteSink {
    async fn send_text(&mut self, text: String) -> Result<()> {
        self.write.send(Message::Text(text.into())).await?;
        Ok(())
    }

    async fn close(&mut self, code: u16, reason: &str) -> Result<()> {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: reason.to_string().into(),
        };
        self.write.send(Message::Close(Some(frame))).await?;
        if let Err(e) = self.write.close().await {
            tracing::debug!("Sink close after close frame: {}", e);
        }
        Ok(())
    }
}
