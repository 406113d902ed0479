//! # Resilient Realtime
//!
//! A WebSocket event-stream client for chat and presence channels that stays
//! connected across flaky networks.
//!
//! Each logical subscription owns one [`ConnectionManager`]: it keeps the socket
//! alive with pings, tells expected closes from dropped links and protocol
//! errors, and reconnects with capped exponential backoff. A
//! [`SubscriptionBinding`] ties a manager to conditions such as sign-in state or
//! the selected conversation.
//!
//! ## Example
//!
//! ```no_run
//! use resilient_realtime::{
//!     ChannelSink, ConnectionConfig, RealtimeEndpoint, SharedToken, SubscriptionBinding,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let endpoint = RealtimeEndpoint::from_api_base("https://api.example.com/api")?;
//!     let token = SharedToken::new(Some("access-token".to_string()));
//!     let (sink, mut events) = ChannelSink::new();
//!
//!     let binding = SubscriptionBinding::new(
//!         ConnectionConfig::chat(&endpoint),
//!         Arc::new(token),
//!         Arc::new(sink),
//!     )?;
//!     binding.update(true, Some("42".to_string())).await?;
//!
//!     while let Some(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//!     Ok(())
//! }
//! ```

pub mod binding;
pub mod connection;
pub mod infrastructure;
pub mod messaging;
pub mod transport;
pub mod types;

pub use binding::SubscriptionBinding;
pub use connection::{
    ChannelSink, ConnectionConfig, ConnectionManager, ConnectionState, ConnectionStatus,
    EndpointBuilder, EventSink, SharedToken, SinkEvent, TokenSupplier,
};
pub use infrastructure::{Channel, PreviewCache, RealtimeEndpoint};
pub use messaging::{DomainEvent, EventKind, UserId, UserStatusChange};
pub use transport::{CloseKind, Connector, FrameSink, Transport, TransportEvent};
pub use types::{ConnectionError, Envelope, ErrorInfo, RealtimeError, Result};
