//! JSON file implementation of the checkpoint store

use crate::checkpoint::traits::{CheckpointError, CheckpointResult, CheckpointStore};
use crate::checkpoint::RunCheckpoint;
use std::fs;
use std::path::{Path, PathBuf};

/// Default location of the checkpoint file
pub const DEFAULT_CHECKPOINT_PATH: &str = "quip-export-state.json";

/// Stores the checkpoint as a single JSON document on disk
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store backed by the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the checkpoint file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CheckpointStore for JsonFileStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn save(&mut self, checkpoint: &RunCheckpoint) -> CheckpointResult<()> {
        let json = serde_json::to_string_pretty(checkpoint)
            .map_err(|e| CheckpointError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn load(&self) -> CheckpointResult<RunCheckpoint> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CheckpointError::NotFound(self.location()));
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| CheckpointError::Corrupt {
            path: self.location(),
            message: e.to_string(),
        })
    }

    fn clear(&mut self) -> CheckpointResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
