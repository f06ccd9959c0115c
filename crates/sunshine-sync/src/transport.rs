use async_trait::async_trait;
use sunshine_core::SyncError;
use tokio::sync::mpsc;

use crate::record::{DataEventBuffer, DataItem, PutDataRequest};

/// Handle identifying a registered data listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Where a transport delivers change batches
pub type DataListener = mpsc::UnboundedSender<DataEventBuffer>;

/// Lifecycle notifications for one connection attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Suspended { cause: i32 },
    Failed(SyncError),
}

/// Sending half handed to [`SyncTransport::connect`].
///
/// Every event is stamped with the attempt's generation so the
/// [`ConnectionManager`](crate::ConnectionManager) can drop events from an
/// attempt it has already abandoned.
#[derive(Debug, Clone)]
pub struct ConnectionEvents {
    generation: u64,
    tx: mpsc::UnboundedSender<(u64, ConnectionEvent)>,
}

impl ConnectionEvents {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<(u64, ConnectionEvent)>) -> Self {
        Self { generation, tx }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn connected(&self) {
        self.emit(ConnectionEvent::Connected);
    }

    pub fn suspended(&self, cause: i32) {
        self.emit(ConnectionEvent::Suspended { cause });
    }

    pub fn failed(&self, error: SyncError) {
        self.emit(ConnectionEvent::Failed(error));
    }

    fn emit(&self, event: ConnectionEvent) {
        if self.tx.send((self.generation, event)).is_err() {
            tracing::trace!("Connection manager gone, dropping event");
        }
    }
}

/// The vendor data-sync API.
///
/// Implementations resolve `connect` once the link is up or refused, and
/// report a later loss of the link through the `events` handle.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    async fn connect(&self, events: ConnectionEvents) -> Result<(), SyncError>;

    async fn disconnect(&self);

    /// Publish a record. Returns the stored item.
    async fn put_data_item(&self, request: PutDataRequest) -> Result<DataItem, SyncError>;

    async fn add_listener(&self, listener: DataListener) -> Result<ListenerId, SyncError>;

    async fn remove_listener(&self, id: ListenerId) -> Result<(), SyncError>;
}
