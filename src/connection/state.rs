use crate::infrastructure::TaskManager;
use crate::types::ErrorInfo;
use std::time::Duration;

/// Lifecycle status of one subscription's transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Idle,
    Connecting,
    Open,
    Closing,
    Closed,
}

impl ConnectionStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Open or on the way there
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Open | Self::Connecting)
    }
}

/// Read-only view of a manager's state
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionState {
    pub status: ConnectionStatus,
    /// Consecutive reconnects since the last successful open
    pub reconnect_attempts: u32,
    pub last_error: Option<ErrorInfo>,
    /// Delay of the currently pending reconnect, if one is scheduled
    pub next_retry_delay: Option<Duration>,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            status: ConnectionStatus::Idle,
            reconnect_attempts: 0,
            last_error: None,
            next_retry_delay: None,
        }
    }
}

/// Consolidated mutable state for ConnectionManager
/// Using a single struct keeps every transition under one lock
pub(crate) struct ManagerState {
    pub snapshot: ConnectionState,

    /// Bumped for every transport attempt and on disconnect; events and timers
    /// carrying an older value are ignored
    pub generation: u64,

    /// Set by disconnect(), suppresses automatic reconnection
    pub manual_close: bool,

    /// Set by teardown(); the manager never connects again
    pub released: bool,

    /// A ping went out and no pong has arrived yet
    pub awaiting_pong: bool,

    /// Token read by the latest connect attempt, retries included
    pub token: Option<String>,

    /// Reader, heartbeat and reconnect tasks
    pub tasks: TaskManager,
}

impl ManagerState {
    pub fn new() -> Self {
        Self {
            snapshot: ConnectionState::default(),
            generation: 0,
            manual_close: false,
            released: false,
            awaiting_pong: false,
            token: None,
            tasks: TaskManager::new(),
        }
    }

    /// Current generation, if it still belongs to a live manager
    pub fn accepts(&self, generation: u64) -> bool {
        !self.released && self.generation == generation
    }
}
