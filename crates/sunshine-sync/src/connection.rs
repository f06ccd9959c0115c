//! Connection lifecycle state machine.
//!
//! One `ConnectionManager` owns at most one live connection. Transitions are
//! driven by [`ConnectionEvent`] messages and published on a watch channel so
//! callers can observe or await them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sunshine_core::SyncError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::transport::{ConnectionEvent, ConnectionEvents, SyncTransport};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Failed(SyncError),
}

impl ConnectionState {
    /// True once an attempt has resolved one way or the other.
    pub fn is_settled(&self) -> bool {
        !matches!(self, ConnectionState::Connecting)
    }

    /// True if `connect_if_absent` would start a new attempt.
    pub fn can_start_connect(&self) -> bool {
        matches!(
            self,
            ConnectionState::Disconnected | ConnectionState::Failed(_)
        )
    }

    /// State after applying `event`, or `None` if the event doesn't apply here.
    pub fn on_event(&self, event: &ConnectionEvent) -> Option<ConnectionState> {
        match (self, event) {
            (ConnectionState::Connecting, ConnectionEvent::Connected) => {
                Some(ConnectionState::Connected)
            }
            (ConnectionState::Connecting, ConnectionEvent::Failed(e)) => {
                Some(ConnectionState::Failed(e.clone()))
            }
            (
                ConnectionState::Connecting | ConnectionState::Connected,
                ConnectionEvent::Suspended { .. },
            ) => Some(ConnectionState::Disconnected),
            _ => None,
        }
    }
}

struct Shared {
    state: watch::Sender<ConnectionState>,
    generation: AtomicU64,
}

impl Shared {
    /// True if `generation` was superseded and no newer attempt holds the link.
    ///
    /// A newer live attempt shares the same transport link, so it must not be
    /// torn down on behalf of the old one.
    fn is_abandoned(&self, generation: u64) -> bool {
        generation != self.generation.load(Ordering::SeqCst)
            && self.state.borrow().can_start_connect()
    }

    fn apply(&self, generation: u64, event: ConnectionEvent) {
        self.state.send_if_modified(|state| {
            if generation != self.generation.load(Ordering::SeqCst) {
                tracing::debug!(generation, ?event, "Ignoring event from superseded attempt");
                return false;
            }
            match state.on_event(&event) {
                Some(next) => {
                    match &event {
                        ConnectionEvent::Connected => tracing::info!("Sync channel connected"),
                        ConnectionEvent::Suspended { cause } => {
                            tracing::warn!(cause, "Sync channel connection suspended")
                        }
                        ConnectionEvent::Failed(e) => {
                            tracing::warn!("Failed to connect to sync channel: {}", e)
                        }
                    }
                    *state = next;
                    true
                }
                None => {
                    tracing::debug!(?event, state = ?*state, "Event does not apply");
                    false
                }
            }
        });
    }
}

/// Owns the single connection to the sync channel.
pub struct ConnectionManager {
    transport: Arc<dyn SyncTransport>,
    shared: Arc<Shared>,
    events_tx: mpsc::UnboundedSender<(u64, ConnectionEvent)>,
    driver: JoinHandle<()>,
}

impl ConnectionManager {
    /// Create a manager in the `Disconnected` state. Must be called inside a
    /// tokio runtime.
    pub fn new(transport: Arc<dyn SyncTransport>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let shared = Arc::new(Shared {
            state,
            generation: AtomicU64::new(0),
        });
        let (events_tx, mut events_rx) = mpsc::unbounded_channel::<(u64, ConnectionEvent)>();

        let driver_shared = Arc::clone(&shared);
        let driver = tokio::spawn(async move {
            while let Some((generation, event)) = events_rx.recv().await {
                driver_shared.apply(generation, event);
            }
        });

        Self {
            transport,
            shared,
            events_tx,
            driver,
        }
    }

    pub fn transport(&self) -> &Arc<dyn SyncTransport> {
        &self.transport
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Start connecting unless a connection is already live or in flight.
    ///
    /// Returns `true` if a new attempt was started.
    pub fn connect_if_absent(&self) -> bool {
        let mut generation = 0;
        let started = self.shared.state.send_if_modified(|state| {
            if !state.can_start_connect() {
                return false;
            }
            generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *state = ConnectionState::Connecting;
            true
        });

        if !started {
            tracing::debug!(state = ?self.state(), "Connection already present");
            return false;
        }

        tracing::debug!(generation, "Connecting to sync channel");
        let transport = Arc::clone(&self.transport);
        let shared = Arc::clone(&self.shared);
        let events = ConnectionEvents::new(generation, self.events_tx.clone());
        tokio::spawn(async move {
            match transport.connect(events.clone()).await {
                Ok(()) if shared.is_abandoned(generation) => {
                    tracing::debug!(generation, "Closing link opened by an abandoned attempt");
                    transport.disconnect().await;
                }
                Ok(()) => events.connected(),
                Err(e) => events.failed(e),
            }
        });
        true
    }

    /// Wait until the current attempt (if any) resolves and return the state.
    ///
    /// There is no timeout: a transport that never answers keeps this pending.
    pub async fn wait_settled(&self) -> ConnectionState {
        let mut rx = self.subscribe();
        let state = match rx.wait_for(ConnectionState::is_settled).await {
            Ok(state) => state.clone(),
            Err(_) => ConnectionState::Disconnected,
        };
        state
    }

    /// `connect_if_absent` followed by `wait_settled`.
    pub async fn ensure_connected(&self) -> ConnectionState {
        self.connect_if_absent();
        self.wait_settled().await
    }

    /// Drop the connection. Any in-flight attempt is abandoned.
    ///
    /// Returns `true` if there was something to release.
    pub async fn release(&self) -> bool {
        let previous = self.shared.state.send_replace(ConnectionState::Disconnected);
        self.shared.generation.fetch_add(1, Ordering::SeqCst);

        match previous {
            ConnectionState::Connecting | ConnectionState::Connected => {
                tracing::debug!(?previous, "Releasing sync channel connection");
                self.transport.disconnect().await;
                true
            }
            _ => false,
        }
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if matches!(
            *self.shared.state.borrow(),
            ConnectionState::Connecting | ConnectionState::Connected
        ) {
            tracing::warn!("Connection manager dropped without release");
        }
        self.driver.abort();
    }
}
