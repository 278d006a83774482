//! Output destinations for exported folders and documents
//!
//! This module contains:
//! - The `Sink` trait and `ExportedDocument`
//! - `SinkDispatch`, which fans events out with per-sink failure isolation
//! - The filesystem and Notion-style workspace sinks

mod dispatch;
mod filesystem;
pub mod notion;
mod paths;
mod traits;

pub use dispatch::{DispatchReport, SinkDispatch};
pub use filesystem::{sanitize_component, FilesystemSink, DEFAULT_EXPORT_ROOT};
pub use notion::{plan_pages, NotionSink, PagePlan};
pub use paths::PathCache;
pub use traits::{ExportedDocument, Sink, SinkError, SinkResult};

/// Sink ids accepted in configuration
pub const KNOWN_SINKS: &[&str] = &["fs", "notion"];
