// Connection module - Per-subscription lifecycle and its collaborators
pub mod config;
pub mod credentials;
pub mod manager;
pub mod sink;
pub mod state;

pub use config::{ConnectionConfig, EndpointBuilder};
pub use credentials::{SharedToken, TokenSupplier};
pub(crate) use manager::ManagerCore;
pub use manager::ConnectionManager;
pub use sink::{ChannelSink, EventSink, SinkEvent};
pub use state::{ConnectionState, ConnectionStatus};
