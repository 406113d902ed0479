// Infrastructure module - Background services and utilities
pub mod cache;
pub mod endpoint;
pub(crate) mod heartbeat;
pub mod task_manager;
pub mod timer;

pub use cache::PreviewCache;
pub use endpoint::{Channel, RealtimeEndpoint};
pub(crate) use heartbeat::HeartbeatManager;
pub use task_manager::{TaskManager, TaskSlot};
pub use timer::Backoff;
