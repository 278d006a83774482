//! Local filesystem sink
//!
//! Mirrors the remote folder tree as directories and writes each document
//! as an `.html` file. Rewriting a file on redelivery is harmless.

use crate::sinks::paths::PathCache;
use crate::sinks::traits::{ExportedDocument, Sink, SinkResult};
use crate::state::FolderRecord;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Default export directory
pub const DEFAULT_EXPORT_ROOT: &str = "export";

pub struct FilesystemSink {
    root: PathBuf,
    paths: PathCache,
}

impl FilesystemSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            paths: PathCache::new(),
        }
    }

    /// Export directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative directory of a folder, `""` for the root or unknown folders
    pub fn folder_path(&self, folder_id: &str) -> &str {
        self.paths.get(folder_id).unwrap_or("")
    }
}

/// Makes a title safe to use as a single path component
///
/// Slashes become underscores. Titles that would be empty or refer to the
/// current or parent directory fall back to the id.
pub fn sanitize_component(title: &str, fallback: &str) -> String {
    let cleaned = title.replace(['/', '\\'], "_");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        fallback.replace(['/', '\\'], "_")
    } else {
        trimmed.to_string()
    }
}

#[async_trait]
impl Sink for FilesystemSink {
    fn id(&self) -> &str {
        "fs"
    }

    async fn on_folder_discovered(
        &mut self,
        folder: &FolderRecord,
        parent: &FolderRecord,
    ) -> SinkResult<()> {
        let relative = format!(
            "{}{}/",
            self.folder_path(&parent.id),
            sanitize_component(&folder.title, &folder.id)
        );

        tokio::fs::create_dir_all(self.root.join(&relative)).await?;
        tracing::debug!("Created directory {}", relative);

        self.paths.insert(folder.id.clone(), relative);
        Ok(())
    }

    async fn on_file_discovered(
        &mut self,
        document: &ExportedDocument,
        parent: &FolderRecord,
    ) -> SinkResult<()> {
        let directory = self.root.join(self.folder_path(&parent.id));
        tokio::fs::create_dir_all(&directory).await?;

        let name = format!("{}.html", sanitize_component(document.title(), document.id()));
        let target = directory.join(name);
        tokio::fs::write(&target, &document.html).await?;
        tracing::debug!("Wrote {}", target.display());
        Ok(())
    }

    fn save_checkpoint(&self) -> SinkResult<serde_json::Value> {
        self.paths.to_checkpoint()
    }

    fn load_checkpoint(&mut self, data: serde_json::Value) -> SinkResult<()> {
        self.paths = PathCache::from_checkpoint(data)?;
        Ok(())
    }
}
