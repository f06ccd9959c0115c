//! Device-sync channel between the phone and the wearable.
//!
//! Records are opaque keyed data items replicated by a vendor service. This
//! crate models them, puts the vendor API behind [`SyncTransport`], and
//! tracks the connection lifecycle with [`ConnectionManager`].

pub mod connection;
pub mod loopback;
pub mod record;
pub mod transport;
pub mod weather_record;

pub use connection::{ConnectionManager, ConnectionState};
pub use loopback::{LoopbackNetwork, LoopbackTransport};
pub use record::{
    DataEvent, DataEventBuffer, DataEventKind, DataItem, DataMap, DataValue, PutDataRequest,
};
pub use sunshine_core::SyncError;
pub use transport::{ConnectionEvent, ConnectionEvents, DataListener, ListenerId, SyncTransport};
pub use weather_record::{
    decode_weather, encode_weather, KEY_HIGH, KEY_LOW, KEY_WEATHER_ID, WEATHER_PATH,
};
