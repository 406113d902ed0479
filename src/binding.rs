//! Ties a [`ConnectionManager`] to conditions owned by the caller.
//!
//! A subscription is eligible while it is enabled, has an identity (the
//! conversation id, or the signed-in user for presence) and the token supplier
//! returns a token. The binding keeps exactly one connected manager while
//! eligible and none otherwise.

use crate::connection::{
    ConnectionConfig, ConnectionManager, ConnectionState, ConnectionStatus, EventSink,
    TokenSupplier,
};
use crate::transport::{Connector, TungsteniteConnector};
use crate::types::{Envelope, Result};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

struct ActiveSubscription {
    identity: String,
    manager: ConnectionManager,
}

struct BindingState {
    enabled: bool,
    identity: Option<String>,
    active: Option<ActiveSubscription>,
    released: bool,
}

/// Owner-scoped handle for one logical subscription.
///
/// Call [`update`](Self::update) whenever the enabled flag or identity changes
/// and [`refresh`](Self::refresh) when the token may have changed. Call
/// [`teardown`](Self::teardown) from the owner's cleanup path.
pub struct SubscriptionBinding {
    config: ConnectionConfig,
    tokens: Arc<dyn TokenSupplier>,
    sink: Arc<dyn EventSink>,
    connector: Arc<dyn Connector>,
    state: Mutex<BindingState>,
    status_tx: Arc<watch::Sender<ConnectionStatus>>,
}

impl SubscriptionBinding {
    /// Creates an idle binding. `config.enabled` is the initial enabled flag.
    pub fn new(
        config: ConnectionConfig,
        tokens: Arc<dyn TokenSupplier>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        Self::with_connector(config, tokens, sink, Arc::new(TungsteniteConnector))
    }

    pub fn with_connector(
        config: ConnectionConfig,
        tokens: Arc<dyn TokenSupplier>,
        sink: Arc<dyn EventSink>,
        connector: Arc<dyn Connector>,
    ) -> Result<Self> {
        config.validate()?;
        let (status_tx, _) = watch::channel(ConnectionStatus::Idle);

        Ok(Self {
            state: Mutex::new(BindingState {
                enabled: config.enabled,
                identity: None,
                active: None,
                released: false,
            }),
            config,
            tokens,
            sink,
            connector,
            status_tx: Arc::new(status_tx),
        })
    }

    /// Applies new conditions and reconciles the live connection with them.
    ///
    /// Switching identity tears the old connection down completely before the
    /// new one is opened.
    pub async fn update(&self, enabled: bool, identity: Option<String>) -> Result<()> {
        let mut state = self.state.lock().await;
        state.enabled = enabled;
        state.identity = identity;
        self.reconcile(&mut state).await
    }

    /// Re-reads the token and reconciles; call after login, logout or token refresh
    pub async fn refresh(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        self.reconcile(&mut state).await
    }

    async fn reconcile(&self, state: &mut BindingState) -> Result<()> {
        if state.released {
            return Ok(());
        }

        let target = match (state.enabled, state.identity.clone(), self.tokens.access_token()) {
            (true, Some(identity), Some(token)) => Some((identity, token)),
            _ => None,
        };

        let Some((identity, token)) = target else {
            if let Some(active) = state.active.take() {
                tracing::debug!("Subscription for {} no longer eligible", active.identity);
                active.manager.teardown().await;
            }
            return Ok(());
        };

        // compare with the token the manager last connected with, which a retry
        // may have refreshed on its own
        if let Some(active) = &state.active
            && active.identity == identity
            && active.manager.token_in_use().await.as_deref() == Some(token.as_str())
        {
            // keep a pending backoff instead of short-circuiting it
            if active.manager.state().await.next_retry_delay.is_none() {
                active.manager.connect().await?;
            }
            return Ok(());
        }

        if let Some(previous) = state.active.take() {
            tracing::info!(
                "Switching subscription from {} to {}",
                previous.identity,
                identity
            );
            previous.manager.teardown().await;
        }

        let manager = ConnectionManager::with_status_channel(
            self.config.clone().with_enabled(true),
            Some(identity.clone()),
            Arc::clone(&self.tokens),
            Arc::clone(&self.sink),
            Arc::clone(&self.connector),
            Arc::clone(&self.status_tx),
        )?;
        let result = manager.connect().await;

        state.active = Some(ActiveSubscription { identity, manager });
        result
    }

    pub fn is_connected(&self) -> bool {
        self.status().is_open()
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status_tx.borrow()
    }

    /// Status of whichever manager is current; survives identity switches
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    /// State of the current manager, if one exists
    pub async fn state(&self) -> Option<ConnectionState> {
        let manager = self.current_manager().await?;
        Some(manager.state().await)
    }

    /// Identity of the live subscription
    pub async fn identity(&self) -> Option<String> {
        let state = self.state.lock().await;
        state.active.as_ref().map(|active| active.identity.clone())
    }

    /// Sends through the current manager; does nothing when not open
    pub async fn send_control_message(&self, envelope: &Envelope) -> Result<()> {
        match self.current_manager().await {
            Some(manager) => manager.send_control_message(envelope).await,
            None => Ok(()),
        }
    }

    /// Disconnects and releases the binding for good. Idempotent.
    pub async fn teardown(&self) {
        let mut state = self.state.lock().await;
        state.released = true;
        if let Some(active) = state.active.take() {
            active.manager.teardown().await;
        }
    }

    async fn current_manager(&self) -> Option<ConnectionManager> {
        let state = self.state.lock().await;
        state.active.as_ref().map(|active| active.manager.clone())
    }
}
