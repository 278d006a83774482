//! State module for tracking export progress
//!
//! This module holds the mutable run state that the checkpoint captures.
//!
//! # Components
//!
//! - `Frontier`: the folder and file work stacks still to be processed
//! - `VisitedRegistry`: every folder fetched so far, keyed by id
//! - `FolderRecord`: an immutable snapshot of one remote folder

mod frontier;
mod registry;

// Re-export main types
pub use frontier::{FileWork, FolderWork, Frontier};
pub use registry::{ChildRef, FolderRecord, VisitedRegistry, ROOT_FOLDER_ID};
