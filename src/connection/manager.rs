use super::state::ManagerState;
use super::{ConnectionConfig, ConnectionState, ConnectionStatus, EventSink, TokenSupplier};
use crate::infrastructure::{HeartbeatManager, TaskSlot};
use crate::messaging::{EventKind, MessageRouter, Routed};
use crate::transport::{CloseKind, Connector, FrameSink, TransportEvent, TungsteniteConnector};
use crate::types::constants::WS_CLOSE_NORMAL;
use crate::types::{ConnectionError, Envelope, ErrorInfo, RealtimeError, Result};
use futures::StreamExt;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex, watch};
use url::Url;

/// Why a connect attempt is being made
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectTrigger {
    /// A caller asked for it
    Explicit,
    /// The reconnect timer for the given generation fired
    Retry(u64),
}

struct LinkWriter {
    generation: u64,
    sink: Box<dyn FrameSink>,
}

/// Owns one logical realtime subscription and its transport.
///
/// `ConnectionManager` opens the socket, keeps it alive with pings, classifies
/// closes and reconnects with capped exponential backoff. Every transport
/// callback funnels through a single state-machine entry point, and every
/// background task re-checks the connection generation before acting, so a
/// timer or socket that outlives a disconnect is inert.
///
/// # Example
///
/// ```no_run
/// use resilient_realtime::{ChannelSink, ConnectionConfig, ConnectionManager, RealtimeEndpoint};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let endpoint = RealtimeEndpoint::from_api_base("https://api.example.com/api")?;
/// let (sink, mut events) = ChannelSink::new();
///
/// let manager = ConnectionManager::new(
///     ConnectionConfig::chat(&endpoint),
///     Some("42".to_string()),
///     Arc::new(|| Some("access-token".to_string())),
///     Arc::new(sink),
/// )?;
///
/// manager.connect().await?;
/// while let Some(event) = events.recv().await {
///     println!("{:?}", event);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConnectionManager {
    core: Arc<ManagerCore>,
}

impl ConnectionManager {
    /// Creates a manager backed by a real WebSocket. Does not connect.
    ///
    /// # Errors
    ///
    /// Returns [`RealtimeError::Config`] if the configuration is invalid.
    pub fn new(
        config: ConnectionConfig,
        identity: Option<String>,
        tokens: Arc<dyn TokenSupplier>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        Self::with_connector(config, identity, tokens, sink, Arc::new(TungsteniteConnector))
    }

    /// Creates a manager over an arbitrary transport
    pub fn with_connector(
        config: ConnectionConfig,
        identity: Option<String>,
        tokens: Arc<dyn TokenSupplier>,
        sink: Arc<dyn EventSink>,
        connector: Arc<dyn Connector>,
    ) -> Result<Self> {
        let (status_tx, _) = watch::channel(ConnectionStatus::Idle);
        Self::with_status_channel(config, identity, tokens, sink, connector, Arc::new(status_tx))
    }

    /// Publishes status into a channel owned by the caller, so a binding can
    /// swap managers without its observers resubscribing
    pub(crate) fn with_status_channel(
        config: ConnectionConfig,
        identity: Option<String>,
        tokens: Arc<dyn TokenSupplier>,
        sink: Arc<dyn EventSink>,
        connector: Arc<dyn Connector>,
        status_tx: Arc<watch::Sender<ConnectionStatus>>,
    ) -> Result<Self> {
        config.validate()?;

        let core = Arc::new_cyclic(|weak_self| ManagerCore {
            router: MessageRouter::new(Arc::clone(&sink)),
            config,
            identity,
            tokens,
            connector,
            sink,
            state: Mutex::new(ManagerState::new()),
            writer: Mutex::new(None),
            status_tx,
            weak_self: weak_self.clone(),
        });

        Ok(Self { core })
    }

    /// Opens the transport.
    ///
    /// This is a no-op when the manager is already open or connecting, when the
    /// config is disabled, or when no identity or token is available. An explicit
    /// call after retries were exhausted starts a fresh retry budget.
    ///
    /// # Errors
    ///
    /// Returns an error only if the endpoint builder fails. Handshake and network
    /// failures are handled by the reconnect policy.
    pub async fn connect(&self) -> Result<()> {
        self.core.connect(ConnectTrigger::Explicit).await
    }

    /// Closes the transport with a normal closure and suppresses reconnection.
    ///
    /// Both timers are cleared. Safe to call repeatedly.
    pub async fn disconnect(&self, reason: &str) {
        self.core.shutdown(reason, false).await;
    }

    /// Disconnects and permanently releases the manager. Idempotent.
    pub async fn teardown(&self) {
        self.core.shutdown("teardown", true).await;
    }

    /// Sends a control envelope; silently does nothing unless the transport is open
    pub async fn send_control_message(&self, envelope: &Envelope) -> Result<()> {
        self.core.send_control_message(envelope).await
    }

    pub fn is_connected(&self) -> bool {
        self.status().is_open()
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.core.status_tx.borrow()
    }

    /// Receiver that observes every status transition
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.core.status_tx.subscribe()
    }

    /// Snapshot of status, retry counter and last error
    pub async fn state(&self) -> ConnectionState {
        self.core.state.lock().await.snapshot.clone()
    }

    pub fn identity(&self) -> Option<&str> {
        self.core.identity.as_deref()
    }

    /// Token used by the most recent connect attempt
    pub(crate) async fn token_in_use(&self) -> Option<String> {
        self.core.state.lock().await.token.clone()
    }
}

pub(crate) struct ManagerCore {
    config: ConnectionConfig,
    identity: Option<String>,
    tokens: Arc<dyn TokenSupplier>,
    connector: Arc<dyn Connector>,
    sink: Arc<dyn EventSink>,
    router: MessageRouter,
    state: Mutex<ManagerState>,
    writer: Mutex<Option<LinkWriter>>,
    status_tx: Arc<watch::Sender<ConnectionStatus>>,
    weak_self: Weak<ManagerCore>,
}

impl ManagerCore {
    fn set_status(&self, state: &mut ManagerState, status: ConnectionStatus) {
        if state.snapshot.status != status {
            tracing::debug!("Status {:?} -> {:?}", state.snapshot.status, status);
        }
        state.snapshot.status = status;
        self.status_tx.send_replace(status);
    }

    async fn connect(&self, trigger: ConnectTrigger) -> Result<()> {
        let mut state = self.state.lock().await;

        if state.released {
            tracing::debug!("Manager released, ignoring connect");
            return Ok(());
        }

        match trigger {
            ConnectTrigger::Retry(generation) => {
                if state.manual_close || state.generation != generation {
                    return Ok(());
                }
                // the timer task is the caller; let it finish on its own
                state.tasks.release(TaskSlot::Reconnect);
                state.snapshot.next_retry_delay = None;
            }
            ConnectTrigger::Explicit => {
                if state.snapshot.status.is_active() {
                    return Ok(());
                }
                state.tasks.cancel(TaskSlot::Reconnect);
                state.snapshot.next_retry_delay = None;
            }
        }

        if state.snapshot.status.is_active() {
            return Ok(());
        }

        if !self.config.enabled {
            tracing::debug!("Subscription disabled, not connecting");
            return Ok(());
        }

        let Some(identity) = self.identity.as_deref() else {
            tracing::debug!("{}, no identity", ConnectionError::Unauthenticated);
            return Ok(());
        };
        let Some(token) = self.tokens.access_token() else {
            tracing::debug!("{}, no access token", ConnectionError::Unauthenticated);
            return Ok(());
        };

        if trigger == ConnectTrigger::Explicit {
            let exhausted = matches!(
                state.snapshot.last_error,
                Some(ErrorInfo {
                    error: ConnectionError::RetryExhausted { .. },
                    ..
                })
            );
            // a manual close or giving up ends the session; start a fresh budget
            if state.manual_close || exhausted {
                state.snapshot.reconnect_attempts = 0;
                state.snapshot.last_error = None;
            }
            state.manual_close = false;
        }

        let url = (self.config.endpoint_builder)(identity, &token)?;
        state.token = Some(token);

        state.generation += 1;
        let generation = state.generation;
        self.set_status(&mut state, ConnectionStatus::Connecting);

        tracing::info!(
            "Connecting to {}{} (generation {})",
            url.host_str().unwrap_or_default(),
            url.path(),
            generation
        );

        let reader = Self::run_reader(
            self.weak_self.clone(),
            Arc::clone(&self.connector),
            url,
            generation,
        );
        state.tasks.spawn(TaskSlot::Reader, reader);
        Ok(())
    }

    /// Handshake plus inbound read loop for one generation
    async fn run_reader(
        core: Weak<ManagerCore>,
        connector: Arc<dyn Connector>,
        url: Url,
        generation: u64,
    ) {
        let result = connector.connect(&url).await;

        let Some(this) = core.upgrade() else {
            return;
        };

        let mut events = match result {
            Ok(transport) => {
                this.install_writer(generation, transport.sink).await;
                this.handle_transport_event(generation, TransportEvent::Open).await;
                transport.events
            }
            Err(e) => {
                let reason = e.to_string();
                this.handle_transport_event(generation, TransportEvent::Error(reason.clone()))
                    .await;
                this.handle_transport_event(generation, TransportEvent::abnormal(reason)).await;
                return;
            }
        };
        drop(this);

        loop {
            let next = events.next().await;

            let Some(this) = core.upgrade() else {
                return;
            };

            match next {
                Some(event) => {
                    let closed = matches!(event, TransportEvent::Closed { .. });
                    this.handle_transport_event(generation, event).await;
                    if closed {
                        return;
                    }
                }
                None => {
                    this.handle_transport_event(
                        generation,
                        TransportEvent::abnormal("stream ended without close frame"),
                    )
                    .await;
                    return;
                }
            }
        }
    }

    async fn install_writer(&self, generation: u64, mut sink: Box<dyn FrameSink>) {
        let state = self.state.lock().await;
        if !state.accepts(generation) {
            drop(state);
            tracing::debug!("Handshake for generation {} finished after disconnect", generation);
            if let Err(e) = sink.close(WS_CLOSE_NORMAL, "superseded").await {
                tracing::debug!("Failed to close superseded link: {}", e);
            }
            return;
        }

        let mut writer = self.writer.lock().await;
        *writer = Some(LinkWriter { generation, sink });
    }

    async fn clear_writer(&self, generation: u64) {
        let mut writer = self.writer.lock().await;
        if writer.as_ref().is_some_and(|w| w.generation == generation) {
            *writer = None;
        }
    }

    /// Single entry point for everything the transport reports
    pub(crate) async fn handle_transport_event(&self, generation: u64, event: TransportEvent) {
        let mut state = self.state.lock().await;

        if !state.accepts(generation) {
            tracing::trace!(
                "Ignoring {:?} from stale generation {} (current {})",
                event,
                generation,
                state.generation
            );
            return;
        }

        match event {
            TransportEvent::Open => self.on_open(&mut state, generation),
            TransportEvent::Frame(text) => {
                if self.router.route(&text) == Routed::Control(EventKind::Pong) {
                    state.awaiting_pong = false;
                }
            }
            TransportEvent::Error(e) => {
                tracing::debug!("Transport error (close follows): {}", e);
            }
            TransportEvent::Closed { code, reason } => {
                if !state.snapshot.status.is_active() {
                    tracing::trace!("Close for generation {} already handled", generation);
                    return;
                }
                self.on_closed(&mut state, generation, code, reason);
                drop(state);
                self.clear_writer(generation).await;
            }
        }
    }

    fn on_open(&self, state: &mut ManagerState, generation: u64) {
        state.snapshot.reconnect_attempts = 0;
        state.snapshot.next_retry_delay = None;
        state.snapshot.last_error = None;
        state.awaiting_pong = false;
        self.set_status(state, ConnectionStatus::Open);

        let heartbeat = HeartbeatManager::new(
            self.weak_self.clone(),
            generation,
            self.config.heartbeat_interval,
        );
        state.tasks.spawn(TaskSlot::Heartbeat, heartbeat.run());

        tracing::info!("Connected (generation {})", generation);
        self.sink.on_connect();
    }

    fn on_closed(&self, state: &mut ManagerState, generation: u64, code: u16, reason: String) {
        state.tasks.cancel(TaskSlot::Heartbeat);
        state.tasks.release(TaskSlot::Reader);
        state.awaiting_pong = false;

        if state.manual_close {
            self.set_status(state, ConnectionStatus::Closed);
            return;
        }

        match CloseKind::classify(code) {
            CloseKind::Expected => {
                tracing::info!("Connection closed ({}): {}", code, reason);
                self.set_status(state, ConnectionStatus::Closed);
                return;
            }
            CloseKind::Retryable => {
                tracing::debug!("Connection dropped ({}): {}", code, reason);
            }
            CloseKind::Protocol => {
                tracing::warn!("Connection closed with protocol error {}: {}", code, reason);
                let error = ConnectionError::TransportError { code, reason };
                state.snapshot.last_error = Some(ErrorInfo::new(error.clone()));
                self.sink.on_error(error);
            }
        }

        self.schedule_reconnect(state, generation);
    }

    fn schedule_reconnect(&self, state: &mut ManagerState, generation: u64) {
        let attempts = state.snapshot.reconnect_attempts;
        let max_attempts = self.config.max_reconnect_attempts;

        if attempts >= max_attempts {
            tracing::warn!("Giving up after {} reconnect attempts", attempts);
            let error = ConnectionError::RetryExhausted { attempts };
            state.snapshot.last_error = Some(ErrorInfo::new(error.clone()));
            state.snapshot.next_retry_delay = None;
            self.set_status(state, ConnectionStatus::Closed);
            self.sink.on_error(error);
            return;
        }

        let delay = self.config.backoff().delay_for_attempt(attempts);
        state.snapshot.reconnect_attempts = attempts + 1;
        state.snapshot.next_retry_delay = Some(delay);
        self.set_status(state, ConnectionStatus::Closed);

        tracing::info!(
            "Reconnecting in {:?} (attempt {}/{})",
            delay,
            attempts + 1,
            max_attempts
        );

        let core = self.weak_self.clone();
        state.tasks.spawn(TaskSlot::Reconnect, async move {
            tokio::time::sleep(delay).await;

            let Some(core) = core.upgrade() else {
                return;
            };
            if let Err(e) = core.connect(ConnectTrigger::Retry(generation)).await {
                tracing::error!("Reconnect attempt failed to start: {}", e);
            }
        });
    }

    /// One heartbeat tick; false stops the heartbeat loop
    pub(crate) async fn heartbeat_tick(&self, generation: u64) -> bool {
        let mut state = self.state.lock().await;

        if !state.accepts(generation) {
            return false;
        }
        if !state.snapshot.status.is_open() {
            return true;
        }

        if self.config.close_on_missed_pong && state.awaiting_pong {
            tracing::info!("No pong since the last ping, treating link as dead");
            // this task owns the heartbeat slot, so detach it instead of aborting
            state.tasks.release(TaskSlot::Heartbeat);
            state.tasks.cancel(TaskSlot::Reader);
            drop(state);
            self.clear_writer(generation).await;
            self.handle_transport_event(generation, TransportEvent::abnormal("missed pong"))
                .await;
            return false;
        }

        state.awaiting_pong = true;
        drop(state);

        match self.send_on(generation, &Envelope::ping()).await {
            Ok(()) => tracing::debug!("Sent ping (generation {})", generation),
            Err(e) => tracing::error!("Failed to send ping: {}", e),
        }
        true
    }

    async fn send_on(&self, generation: u64, envelope: &Envelope) -> Result<()> {
        let text = envelope.encode()?;

        let mut writer = self.writer.lock().await;
        match writer.as_mut() {
            Some(link) if link.generation == generation => link.sink.send_text(text).await,
            _ => Err(RealtimeError::NotConnected),
        }
    }

    async fn send_control_message(&self, envelope: &Envelope) -> Result<()> {
        let generation = {
            let state = self.state.lock().await;
            if !state.snapshot.status.is_open() || state.released {
                tracing::debug!("Not open, dropping outbound {}", envelope.kind);
                return Ok(());
            }
            state.generation
        };

        self.send_on(generation, envelope).await
    }

    async fn shutdown(&self, reason: &str, release: bool) {
        let generation = {
            let mut state = self.state.lock().await;
            if release {
                state.released = true;
            }
            state.manual_close = true;
            state.tasks.abort_all();
            state.generation += 1;
            state.awaiting_pong = false;
            state.snapshot.next_retry_delay = None;

            if state.snapshot.status.is_active() {
                self.set_status(&mut state, ConnectionStatus::Closing);
            }
            state.generation
        };

        let link = self.writer.lock().await.take();
        if let Some(mut link) = link {
            if let Err(e) = link.sink.close(WS_CLOSE_NORMAL, reason).await {
                tracing::debug!("Close handshake failed: {}", e);
            }
        }

        let mut state = self.state.lock().await;
        if state.generation == generation && state.snapshot.status != ConnectionStatus::Idle {
            self.set_status(&mut state, ConnectionStatus::Closed);
        }
        tracing::info!("Disconnected: {}", reason);
    }
}
