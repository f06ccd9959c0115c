//! In-memory sync channel.
//!
//! A [`LoopbackNetwork`] plays the part of the vendor data layer shared by a
//! phone and a wearable. Each side gets a [`LoopbackTransport`] endpoint.
//! Endpoints can be told to refuse, hang or suspend so callers can exercise
//! their failure paths.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sunshine_core::SyncError;

use crate::record::{DataEvent, DataItem, PutDataRequest};
use crate::transport::{ConnectionEvents, DataListener, ListenerId, SyncTransport};

struct ListenerEntry {
    endpoint: u64,
    sink: DataListener,
}

#[derive(Default)]
struct NetworkState {
    items: HashMap<String, DataItem>,
    listeners: HashMap<ListenerId, ListenerEntry>,
    next_listener: u64,
    next_endpoint: u64,
}

impl NetworkState {
    fn fan_out(&mut self, event: DataEvent) {
        self.listeners.retain(|id, entry| {
            let delivered = entry.sink.send(vec![event.clone()]).is_ok();
            if !delivered {
                tracing::debug!(%id, "Dropping closed listener");
            }
            delivered
        });
    }
}

/// Shared in-memory data layer
#[derive(Clone, Default)]
pub struct LoopbackNetwork {
    state: Arc<Mutex<NetworkState>>,
}

impl LoopbackNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new endpoint attached to this network
    pub fn endpoint(&self, name: impl Into<String>) -> LoopbackTransport {
        let id = {
            let mut state = self.state.lock();
            state.next_endpoint += 1;
            state.next_endpoint
        };
        LoopbackTransport {
            id,
            name: name.into(),
            network: self.clone(),
            endpoint: Arc::new(Mutex::new(EndpointState::default())),
        }
    }

    /// Latest item stored at `path`
    pub fn item(&self, path: &str) -> Option<DataItem> {
        self.state.lock().items.get(path).cloned()
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    /// Remove the item at `path`, notifying listeners. Returns the number removed.
    pub fn delete_data_items(&self, path: &str) -> usize {
        let mut state = self.state.lock();
        match state.items.remove(path) {
            Some(item) => {
                state.fan_out(DataEvent::deleted(item));
                1
            }
            None => 0,
        }
    }

    /// Store `item`; listeners hear about it only if the payload changed.
    fn store(&self, item: DataItem) -> bool {
        let mut state = self.state.lock();
        if state.items.get(&item.path) == Some(&item) {
            tracing::debug!(path = %item.path, "Payload unchanged, no event");
            return false;
        }
        state.items.insert(item.path.clone(), item.clone());
        state.fan_out(DataEvent::changed(item));
        true
    }

    fn add_listener(&self, endpoint: u64, sink: DataListener) -> ListenerId {
        let mut state = self.state.lock();
        state.next_listener += 1;
        let id = ListenerId(state.next_listener);
        state.listeners.insert(id, ListenerEntry { endpoint, sink });
        id
    }

    fn remove_listener(&self, endpoint: u64, id: ListenerId) -> bool {
        let mut state = self.state.lock();
        match state.listeners.get(&id) {
            Some(entry) if entry.endpoint == endpoint => {
                state.listeners.remove(&id);
                true
            }
            _ => false,
        }
    }

    fn drop_listeners_of(&self, endpoint: u64) -> usize {
        let mut state = self.state.lock();
        let before = state.listeners.len();
        state.listeners.retain(|_, entry| entry.endpoint != endpoint);
        before - state.listeners.len()
    }
}

#[derive(Debug, Clone, Default)]
struct Faults {
    refuse_connect: Option<String>,
    connect_delay: Option<Duration>,
    hang_connect: bool,
    fail_put: Option<String>,
    hang_put: bool,
}

#[derive(Default)]
struct EndpointState {
    connected: bool,
    events: Option<ConnectionEvents>,
    faults: Faults,
    connect_calls: usize,
    disconnect_calls: usize,
    put_calls: usize,
    remove_listener_calls: usize,
}

/// One side of a [`LoopbackNetwork`]
#[derive(Clone)]
pub struct LoopbackTransport {
    id: u64,
    name: String,
    network: LoopbackNetwork,
    endpoint: Arc<Mutex<EndpointState>>,
}

impl LoopbackTransport {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn network(&self) -> &LoopbackNetwork {
        &self.network
    }

    pub fn is_connected(&self) -> bool {
        self.endpoint.lock().connected
    }

    pub fn connect_calls(&self) -> usize {
        self.endpoint.lock().connect_calls
    }

    pub fn disconnect_calls(&self) -> usize {
        self.endpoint.lock().disconnect_calls
    }

    pub fn put_calls(&self) -> usize {
        self.endpoint.lock().put_calls
    }

    pub fn remove_listener_calls(&self) -> usize {
        self.endpoint.lock().remove_listener_calls
    }

    /// Make future connection attempts fail with `reason`
    pub fn refuse_connections(&self, reason: impl Into<String>) {
        self.endpoint.lock().faults.refuse_connect = Some(reason.into());
    }

    /// Make future connection attempts take `delay` before resolving
    pub fn delay_connections(&self, delay: Duration) {
        self.endpoint.lock().faults.connect_delay = Some(delay);
    }

    /// Make future connection attempts never resolve
    pub fn hang_connections(&self) {
        self.endpoint.lock().faults.hang_connect = true;
    }

    /// Make future publishes fail with `reason`
    pub fn fail_puts(&self, reason: impl Into<String>) {
        self.endpoint.lock().faults.fail_put = Some(reason.into());
    }

    /// Make future publishes never resolve
    pub fn hang_puts(&self) {
        self.endpoint.lock().faults.hang_put = true;
    }

    /// Clear all injected faults
    pub fn heal(&self) {
        self.endpoint.lock().faults = Faults::default();
    }

    /// Drop the link as the vendor service would, reporting `cause`
    pub fn suspend(&self, cause: i32) {
        let events = {
            let mut endpoint = self.endpoint.lock();
            endpoint.connected = false;
            endpoint.events.take()
        };
        self.network.drop_listeners_of(self.id);
        if let Some(events) = events {
            events.suspended(cause);
        }
    }
}

#[async_trait]
impl SyncTransport for LoopbackTransport {
    async fn connect(&self, events: ConnectionEvents) -> Result<(), SyncError> {
        let faults = {
            let mut endpoint = self.endpoint.lock();
            endpoint.connect_calls += 1;
            endpoint.faults.clone()
        };

        if let Some(delay) = faults.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if faults.hang_connect {
            tracing::debug!(endpoint = %self.name, "Connect hangs");
            std::future::pending::<()>().await;
        }
        if let Some(reason) = faults.refuse_connect {
            return Err(SyncError::ConnectionFailed(reason));
        }

        let mut endpoint = self.endpoint.lock();
        endpoint.connected = true;
        endpoint.events = Some(events);
        tracing::debug!(endpoint = %self.name, "Connected");
        Ok(())
    }

    async fn disconnect(&self) {
        {
            let mut endpoint = self.endpoint.lock();
            endpoint.disconnect_calls += 1;
            endpoint.connected = false;
            endpoint.events = None;
        }
        let dropped = self.network.drop_listeners_of(self.id);
        tracing::debug!(endpoint = %self.name, dropped, "Disconnected");
    }

    async fn put_data_item(&self, request: PutDataRequest) -> Result<DataItem, SyncError> {
        let faults = {
            let mut endpoint = self.endpoint.lock();
            if !endpoint.connected {
                return Err(SyncError::NotConnected);
            }
            endpoint.put_calls += 1;
            endpoint.faults.clone()
        };

        if faults.hang_put {
            tracing::debug!(endpoint = %self.name, "Publish hangs");
            std::future::pending::<()>().await;
        }
        if let Some(reason) = faults.fail_put {
            return Err(SyncError::PublishFailed(reason));
        }

        let item = request.into_data_item()?;
        self.network.store(item.clone());
        Ok(item)
    }

    async fn add_listener(&self, listener: DataListener) -> Result<ListenerId, SyncError> {
        if !self.is_connected() {
            return Err(SyncError::NotConnected);
        }
        Ok(self.network.add_listener(self.id, listener))
    }

    async fn remove_listener(&self, id: ListenerId) -> Result<(), SyncError> {
        self.endpoint.lock().remove_listener_calls += 1;
        if self.network.remove_listener(self.id, id) {
            Ok(())
        } else {
            Err(SyncError::UnknownListener(id.0))
        }
    }
}
