//! Id-to-destination cache shared by the concrete sinks
//!
//! Each sink remembers where a folder (or document) ended up on its side,
//! a directory path or a page id, so children can be placed beneath it.
//! The cache is what a sink checkpoints.

use crate::sinks::traits::{SinkError, SinkResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathCache {
    paths: BTreeMap<String, String>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.paths.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.paths.contains_key(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, destination: impl Into<String>) {
        self.paths.insert(id.into(), destination.into());
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Serializes as `{ "paths": { id: destination } }`
    pub fn to_checkpoint(&self) -> SinkResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| SinkError::Checkpoint(e.to_string()))
    }

    /// Restores from `to_checkpoint` output; `null` yields an empty cache
    pub fn from_checkpoint(data: serde_json::Value) -> SinkResult<Self> {
        if data.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(data).map_err(|e| SinkError::Checkpoint(e.to_string()))
    }
}
