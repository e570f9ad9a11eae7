//! Entries returned by cache reads, and the metadata attached to them.
//!
//! Every entry carries a [`Metadata`] map that was committed together with
//! its payload. Materialized reads return an [`Entry`]; streaming reads return
//! a [`StreamEntry`] whose payload reader borrows the entry, so the reader can
//! never outlive the snapshot it reads from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;

use crate::error::CacheResult;
use crate::storage::StoreSnapshot;

/// Slot holding the payload bytes.
pub(crate) const PAYLOAD_SLOT: usize = 0;
/// Slot holding the serialized metadata map.
pub(crate) const METADATA_SLOT: usize = 1;
/// Number of slots per entry.
pub(crate) const SLOT_COUNT: usize = 2;

/// Metadata attached to an entry.
pub type Metadata = BTreeMap<String, MetaValue>;

/// A scalar metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl MetaValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetaValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value as a float; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::Float(f) => Some(*f),
            MetaValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Bool(b) => write!(f, "{}", b),
            MetaValue::Int(i) => write!(f, "{}", i),
            MetaValue::Float(x) => write!(f, "{}", x),
            MetaValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Int(value)
    }
}

impl From<i32> for MetaValue {
    fn from(value: i32) -> Self {
        MetaValue::Int(value.into())
    }
}

impl From<u32> for MetaValue {
    fn from(value: u32) -> Self {
        MetaValue::Int(value.into())
    }
}

impl From<f64> for MetaValue {
    fn from(value: f64) -> Self {
        MetaValue::Float(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Text(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::Text(value)
    }
}

/// A fully materialized entry: decoded payload plus its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry<T> {
    data: T,
    metadata: Metadata,
}

impl<T> Entry<T> {
    pub(crate) fn new(data: T, metadata: Metadata) -> Self {
        Self { data, metadata }
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Look up one metadata value.
    pub fn meta(&self, name: &str) -> Option<&MetaValue> {
        self.metadata.get(name)
    }

    pub fn into_data(self) -> T {
        self.data
    }

    pub fn into_parts(self) -> (T, Metadata) {
        (self.data, self.metadata)
    }
}

/// An entry whose payload is read lazily from an open snapshot.
///
/// The snapshot's file handles stay open until [`StreamEntry::close`] is
/// called or the entry is dropped.
#[derive(Debug)]
pub struct StreamEntry<S: StoreSnapshot> {
    snapshot: S,
    metadata: Metadata,
}

impl<S: StoreSnapshot> StreamEntry<S> {
    pub(crate) fn new(snapshot: S, metadata: Metadata) -> Self {
        Self { snapshot, metadata }
    }

    /// Reader over the payload. Reading twice continues where the first left off.
    pub fn data(&mut self) -> CacheResult<&mut dyn Read> {
        self.snapshot.reader(PAYLOAD_SLOT)
    }

    /// Read the remaining payload into memory.
    pub fn read_all(&mut self) -> CacheResult<Vec<u8>> {
        self.snapshot.read_to_end(PAYLOAD_SLOT)
    }

    /// Committed payload length in bytes.
    pub fn len(&self) -> u64 {
        self.snapshot.slot_len(PAYLOAD_SLOT)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn meta(&self, name: &str) -> Option<&MetaValue> {
        self.metadata.get(name)
    }

    /// Run `f` against the underlying snapshot.
    pub(crate) fn with_snapshot<T>(&mut self, f: impl FnOnce(&mut S) -> CacheResult<T>) -> CacheResult<T> {
        f(&mut self.snapshot)
    }

    /// Release the snapshot's handles.
    pub fn close(mut self) {
        self.snapshot.close();
    }
}

impl<S: StoreSnapshot> Drop for StreamEntry<S> {
    fn drop(&mut self) {
        self.snapshot.close();
    }
}

/// Build a [`Metadata`] map from name/value pairs.
///
/// ```
/// use annotated_disk_cache::{metadata, MetaValue};
///
/// let meta = metadata([("lang", MetaValue::from("en")), ("hits", MetaValue::from(3))]);
/// assert_eq!(meta["hits"].as_i64(), Some(3));
/// ```
pub fn metadata<I, K>(pairs: I) -> Metadata
where
    I: IntoIterator<Item = (K, MetaValue)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_json_round_trip() {
        let meta = metadata([
            ("flag", MetaValue::from(true)),
            ("count", MetaValue::from(42i64)),
            ("ratio", MetaValue::from(0.5)),
            ("whole", MetaValue::from(2.0)),
            ("name", MetaValue::from("alpha")),
        ]);
        let json = serde_json::to_string(&meta).unwrap();
        let decoded: Metadata = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, meta);
    }

    #[test]
    fn test_accessors() {
        assert_eq!(MetaValue::from(3).as_i64(), Some(3));
        assert_eq!(MetaValue::from(3).as_f64(), Some(3.0));
        assert_eq!(MetaValue::from("x").as_str(), Some("x"));
        assert_eq!(MetaValue::from(true).as_bool(), Some(true));
        assert_eq!(MetaValue::from("x").as_i64(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(MetaValue::from(7).to_string(), "7");
        assert_eq!(MetaValue::from("seven").to_string(), "seven");
    }

    #[test]
    fn test_entry_parts() {
        let entry = Entry::new("payload".to_string(), metadata([("k", MetaValue::from(1))]));
        assert_eq!(entry.data(), "payload");
        assert_eq!(entry.meta("k"), Some(&MetaValue::Int(1)));
        let (data, meta) = entry.into_parts();
        assert_eq!(data, "payload");
        assert_eq!(meta.len(), 1);
    }
}
