//! Checkpoint store trait and error types
//!
//! This module defines the trait interface for checkpoint backends and
//! associated error types.

use crate::checkpoint::RunCheckpoint;
use thiserror::Error;

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Checkpoint at {path} is unreadable: {message}")]
    Corrupt { path: String, message: String },

    #[error("No checkpoint found at {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Trait for durable checkpoint storage
///
/// A store holds at most one snapshot. Saving overwrites the previous one.
pub trait CheckpointStore: Send {
    /// Returns true if a prior run left a checkpoint behind
    fn exists(&self) -> bool;

    /// Writes a snapshot, replacing any prior one
    fn save(&mut self, checkpoint: &RunCheckpoint) -> CheckpointResult<()>;

    /// Reads the stored snapshot
    ///
    /// Fails with `CheckpointError::Corrupt` if the stored data cannot be
    /// parsed.
    fn load(&self) -> CheckpointResult<RunCheckpoint>;

    /// Removes the stored snapshot, if any
    fn clear(&mut self) -> CheckpointResult<()>;

    /// Human-readable location, used in log messages
    fn location(&self) -> String;
}
