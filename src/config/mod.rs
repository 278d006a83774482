//! Configuration module for quip-export
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use quip_export::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("quip-export.toml")).unwrap();
//! println!("Sinks: {:?}", config.sinks.enabled);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AssetBackend, AssetsConfig, CheckpointConfig, Config, FilesystemConfig, NotionConfig, SinksConfig,
    SourceConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, read_config};
pub use validation::validate;
