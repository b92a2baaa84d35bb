//! Ordered string state carried between phases.
//!
//! The store only knows flat keys, so the list of meaningful keys travels
//! separately as a JSON array under [`SENTINEL_KEY`]. Encoding and decoding
//! of that list lives here; reading and writing the store lives in
//! [`crate::io::state_store`].

use std::collections::HashMap;

use serde::Serialize;
use serde::ser::SerializeMap;

use crate::error::{ActionError, Result};

/// Reserved store key listing every other persisted key.
pub const SENTINEL_KEY: &str = "keys";

/// Phase state: an ordered key list plus the value for each key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    keys: Vec<String>,
    values: HashMap<String, String>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value. New keys are appended to the key order.
    ///
    /// [`SENTINEL_KEY`] and the warning counter key are reserved by the
    /// store protocol; saving a snapshot that holds them is refused.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        if !self.values.contains_key(&key) {
            self.keys.push(key.clone());
        }
        self.values.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.keys.iter().filter_map(|key| {
            self.values
                .get(key)
                .map(|value| (key.as_str(), value.as_str()))
        })
    }

    /// Compact JSON object in key order, for log output.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// JSON array of the key list, the value stored under [`SENTINEL_KEY`].
    pub fn encode_keys(&self) -> String {
        serde_json::to_string(&self.keys).unwrap_or_else(|_| "[]".to_string())
    }
}

impl Serialize for Snapshot {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.keys.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Parse the sentinel value into the ordered key list.
///
/// `None` (sentinel never written) and anything that is not a JSON array of
/// strings are both reported as [`ActionError::StateCorrupt`].
pub fn decode_keys(raw: Option<&str>) -> Result<Vec<String>> {
    let raw = raw.ok_or_else(|| ActionError::StateCorrupt {
        reason: format!("no \"{SENTINEL_KEY}\" entry in state store"),
    })?;
    serde_json::from_str::<Vec<String>>(raw).map_err(|err| ActionError::StateCorrupt {
        reason: format!("invalid \"{SENTINEL_KEY}\" entry: {err}"),
    })
}
