//! Checkpoint module for persisting run state
//!
//! This module handles:
//! - The `RunCheckpoint` snapshot of frontier, registry and sink state
//! - The `CheckpointStore` trait for durable storage backends
//! - A JSON file store that writes snapshots atomically

mod json_file;
mod traits;

pub use json_file::{JsonFileStore, DEFAULT_CHECKPOINT_PATH};
pub use traits::{CheckpointError, CheckpointResult, CheckpointStore};

use crate::state::{Frontier, VisitedRegistry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque per-sink state, round-tripped through the sink's own contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkCheckpoint {
    pub sink_id: String,
    pub data: serde_json::Value,
}

/// The unit written to and read from durable storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunCheckpoint {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub config_hash: Option<String>,
    pub frontier: Frontier,
    pub visited: VisitedRegistry,
    #[serde(default)]
    pub sinks: Vec<SinkCheckpoint>,
}

impl RunCheckpoint {
    /// Returns the saved data for a sink, if any
    pub fn sink_data(&self, sink_id: &str) -> Option<&serde_json::Value> {
        self.sinks
            .iter()
            .find(|s| s.sink_id == sink_id)
            .map(|s| &s.data)
    }

    /// Returns true if the run this checkpoint belongs to has finished
    pub fn is_complete(&self) -> bool {
        self.frontier.is_empty()
    }
}
