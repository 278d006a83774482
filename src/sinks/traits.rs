//! Sink trait and associated types
//!
//! This module defines the contract every output destination implements
//! and the document type handed to sinks.

use crate::pipeline::{HtmlTree, ProcessedDocument};
use crate::source::ThreadMeta;
use crate::state::FolderRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur inside a sink
///
/// These never leave `SinkDispatch`: they are logged and counted.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Destination API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Invalid sink checkpoint: {0}")]
    Checkpoint(String),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// A fully processed document ready for delivery
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    /// Metadata from the source service
    pub meta: ThreadMeta,

    /// Markup after all extensions ran
    pub html: String,

    /// Parsed tree after all extensions ran
    pub tree: HtmlTree,
}

impl ExportedDocument {
    pub fn new(meta: ThreadMeta, processed: ProcessedDocument) -> Self {
        Self {
            meta,
            html: processed.html,
            tree: processed.tree,
        }
    }

    /// Document id
    pub fn id(&self) -> &str {
        &self.meta.id
    }

    /// Document title
    pub fn title(&self) -> &str {
        &self.meta.title
    }
}

/// Trait for output destinations
///
/// A sink may receive the same folder or document more than once after an
/// interrupted run is resumed, and must tolerate it.
#[async_trait]
pub trait Sink: Send {
    /// Stable identity used to key this sink's checkpoint data
    fn id(&self) -> &str;

    /// Called once a folder has been fetched
    ///
    /// `parent` is the synthetic root record for top-level folders.
    async fn on_folder_discovered(
        &mut self,
        folder: &FolderRecord,
        parent: &FolderRecord,
    ) -> SinkResult<()>;

    /// Called once a document has been fetched and processed
    async fn on_file_discovered(
        &mut self,
        document: &ExportedDocument,
        parent: &FolderRecord,
    ) -> SinkResult<()>;

    /// Serializes sink-local state (path caches, cursors)
    fn save_checkpoint(&self) -> SinkResult<serde_json::Value>;

    /// Restores sink-local state saved by `save_checkpoint`
    fn load_checkpoint(&mut self, data: serde_json::Value) -> SinkResult<()>;
}
