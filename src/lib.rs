//! quip-export: a resumable document migration engine
//!
//! This crate walks a remote folder tree on a Quip-style source service,
//! runs every document through a pipeline of content extensions, and fans
//! the results out to any number of output sinks. The whole run is
//! checkpointed so it can be interrupted (rate limits, signals, errors) and
//! resumed later without re-fetching folders or dropping work.

pub mod checkpoint;
pub mod config;
pub mod crawler;
pub mod pipeline;
pub mod sinks;
pub mod source;
pub mod state;

use thiserror::Error;

/// Main error type for export operations
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rate limit exhausted: {budget} budget is at zero")]
    RateLimitExhausted { budget: source::Budget },

    #[error("Transport error for {endpoint}: {source}")]
    Transport {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("Protocol error for {endpoint}: {message}")]
    Protocol {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Corrupt checkpoint at {path}: {message}")]
    CorruptCheckpoint { path: String, message: String },

    #[error("Checkpoint error: {0}")]
    Checkpoint(checkpoint::CheckpointError),

    #[error("Extension {extension} failed: {message}")]
    Extension { extension: String, message: String },

    #[error("Asset upload of {key} failed: {message}")]
    AssetUpload { key: String, message: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Returns true if a later run can pick up where this one stopped
    /// without any operator intervention.
    pub fn is_resumable(&self) -> bool {
        matches!(self, Self::RateLimitExhausted { .. })
    }
}

impl From<checkpoint::CheckpointError> for ExportError {
    fn from(err: checkpoint::CheckpointError) -> Self {
        match err {
            checkpoint::CheckpointError::Corrupt { path, message } => {
                Self::CorruptCheckpoint { path, message }
            }
            other => Self::Checkpoint(other),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for export operations
pub type Result<T> = std::result::Result<T, ExportError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use checkpoint::{CheckpointStore, JsonFileStore, RunCheckpoint};
pub use config::Config;
pub use crawler::{Coordinator, ShutdownReason};
pub use pipeline::{Extension, Pipeline};
pub use sinks::{Sink, SinkDispatch};
pub use source::SourceClient;
pub use state::{Frontier, FolderRecord, VisitedRegistry};
