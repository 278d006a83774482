//! Crawler module for walking the remote folder tree
//!
//! This module contains the core export logic, including:
//! - The depth-first coordinator over the folder and file stacks
//! - The single shutdown entry point that writes checkpoints
//! - Termination signal handling for the binary

mod coordinator;
mod shutdown;

pub use coordinator::{Coordinator, RunOptions, RunStats, StartMode};
pub use shutdown::{shutdown_signal, ShutdownReason};
