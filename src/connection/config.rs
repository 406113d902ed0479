use crate::infrastructure::{Backoff, RealtimeEndpoint};
use crate::types::constants::{
    BASE_RECONNECT_DELAY, HEARTBEAT_INTERVAL, MAX_RECONNECT_ATTEMPTS, MAX_RECONNECT_DELAY,
};
use crate::types::{RealtimeError, Result};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Builds the socket URL from `(identity, token)`; called on every attempt
pub type EndpointBuilder = Arc<dyn Fn(&str, &str) -> Result<Url> + Send + Sync>;

/// Per-subscription configuration, fixed for the lifetime of a manager
#[derive(Clone)]
pub struct ConnectionConfig {
    pub endpoint_builder: EndpointBuilder,
    pub enabled: bool,
    pub heartbeat_interval: Duration,
    pub max_reconnect_attempts: u32,
    pub base_reconnect_delay: Duration,
    pub max_reconnect_delay: Duration,
    /// Treat the link as dead when a ping is still unanswered at the next tick
    pub close_on_missed_pong: bool,
}

impl ConnectionConfig {
    pub fn new(endpoint_builder: EndpointBuilder) -> Self {
        Self {
            endpoint_builder,
            enabled: true,
            heartbeat_interval: Duration::from_millis(HEARTBEAT_INTERVAL),
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            base_reconnect_delay: Duration::from_millis(BASE_RECONNECT_DELAY),
            max_reconnect_delay: Duration::from_millis(MAX_RECONNECT_DELAY),
            close_on_missed_pong: false,
        }
    }

    /// Per-conversation chat channel; the identity is the conversation id
    pub fn chat(endpoint: &RealtimeEndpoint) -> Self {
        Self::new(endpoint.chat_builder())
    }

    /// Global presence channel
    pub fn user_status(endpoint: &RealtimeEndpoint) -> Self {
        Self::new(endpoint.user_status_builder())
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    pub fn with_base_reconnect_delay(mut self, delay: Duration) -> Self {
        self.base_reconnect_delay = delay;
        self
    }

    pub fn with_max_reconnect_delay(mut self, delay: Duration) -> Self {
        self.max_reconnect_delay = delay;
        self
    }

    pub fn with_missed_pong_detection(mut self, enabled: bool) -> Self {
        self.close_on_missed_pong = enabled;
        self
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::new(self.base_reconnect_delay, self.max_reconnect_delay)
    }

    pub fn validate(&self) -> Result<()> {
        if self.heartbeat_interval.is_zero() {
            return Err(RealtimeError::Config(
                "heartbeat interval must be greater than zero".to_string(),
            ));
        }
        if self.base_reconnect_delay.is_zero() {
            return Err(RealtimeError::Config(
                "base reconnect delay must be greater than zero".to_string(),
            ));
        }
        if self.max_reconnect_delay < self.base_reconnect_delay {
            return Err(RealtimeError::Config(
                "max reconnect delay must not be below the base delay".to_string(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("enabled", &self.enabled)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field("max_reconnect_attempts", &self.max_reconnect_attempts)
            .field("base_reconnect_delay", &self.base_reconnect_delay)
            .field("max_reconnect_delay", &self.max_reconnect_delay)
            .field("close_on_missed_pong", &self.close_on_missed_pong)
            .finish_non_exhaustive()
    }
}
