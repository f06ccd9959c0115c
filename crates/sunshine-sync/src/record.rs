//! Keyed records replicated over the sync channel.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sunshine_core::SyncError;

/// A typed field value inside a [`DataMap`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum DataValue {
    String(String),
    Int(i32),
}

/// Ordered bundle of typed fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataMap {
    entries: BTreeMap<String, DataValue>,
}

impl DataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(key.into(), DataValue::String(value.into()));
    }

    pub fn put_int(&mut self, key: impl Into<String>, value: i32) {
        self.entries.insert(key.into(), DataValue::Int(value));
    }

    /// String value for `key`, `None` if missing or not a string
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(DataValue::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Int value for `key`, `None` if missing or not an int
    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.entries.get(key) {
            Some(DataValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode into the opaque payload stored in a [`DataItem`]
    pub fn to_bytes(&self) -> Result<Vec<u8>, SyncError> {
        serde_json::to_vec(self).map_err(|e| SyncError::PublishFailed(e.to_string()))
    }

    pub fn from_bytes(path: &str, bytes: &[u8]) -> Result<Self, SyncError> {
        serde_json::from_slice(bytes).map_err(|e| SyncError::decode(path, e.to_string()))
    }
}

/// Request to publish a [`DataMap`] at a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutDataRequest {
    path: String,
    map: DataMap,
}

impl PutDataRequest {
    pub fn create(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            map: DataMap::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn data_map(&self) -> &DataMap {
        &self.map
    }

    pub fn data_map_mut(&mut self) -> &mut DataMap {
        &mut self.map
    }

    pub fn into_data_item(self) -> Result<DataItem, SyncError> {
        let data = self.map.to_bytes()?;
        Ok(DataItem {
            path: self.path,
            data,
        })
    }
}

/// A replicated record: a path plus an opaque payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataItem {
    pub path: String,
    pub data: Vec<u8>,
}

impl DataItem {
    /// Decode the payload back into a [`DataMap`]
    pub fn data_map(&self) -> Result<DataMap, SyncError> {
        DataMap::from_bytes(&self.path, &self.data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataEventKind {
    Changed,
    Deleted,
}

/// One change notification delivered to listeners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEvent {
    pub kind: DataEventKind,
    pub item: DataItem,
}

impl DataEvent {
    pub fn changed(item: DataItem) -> Self {
        Self {
            kind: DataEventKind::Changed,
            item,
        }
    }

    pub fn deleted(item: DataItem) -> Self {
        Self {
            kind: DataEventKind::Deleted,
            item,
        }
    }
}

/// Batch of events delivered together
pub type DataEventBuffer = Vec<DataEvent>;
