// Messaging module - Envelope kinds and inbound routing
pub mod event;
pub mod router;

pub use event::{DomainEvent, EventKind, UserId, UserStatusChange};
pub use router::{MessageRouter, Routed};
