/// Frontier stacks for depth-first traversal
///
/// The tail of each `Vec` is the top of the stack. Work items are only
/// removed once they are fully processed, so a checkpoint taken while an
/// item is in flight still contains it.
use serde::{Deserialize, Serialize};

/// A folder waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderWork {
    pub folder_id: String,
    pub parent_folder_id: String,
}

/// A document waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileWork {
    pub file_id: String,
    pub parent_folder_id: String,
}

/// Pending work of the current run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frontier {
    /// Folder work items, last pushed is processed first
    pub folders: Vec<FolderWork>,

    /// File work items, last pushed is processed first
    pub files: Vec<FileWork>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a folder onto the folder stack
    pub fn push_folder(&mut self, folder_id: impl Into<String>, parent_folder_id: impl Into<String>) {
        self.folders.push(FolderWork {
            folder_id: folder_id.into(),
            parent_folder_id: parent_folder_id.into(),
        });
    }

    /// Pushes a document onto the file stack
    pub fn push_file(&mut self, file_id: impl Into<String>, parent_folder_id: impl Into<String>) {
        self.files.push(FileWork {
            file_id: file_id.into(),
            parent_folder_id: parent_folder_id.into(),
        });
    }

    /// Returns the folder on top of the stack without removing it
    pub fn peek_folder(&self) -> Option<&FolderWork> {
        self.folders.last()
    }

    /// Returns the file on top of the stack without removing it
    pub fn peek_file(&self) -> Option<&FileWork> {
        self.files.last()
    }

    /// Removes the top folder item
    pub fn pop_folder(&mut self) -> Option<FolderWork> {
        self.folders.pop()
    }

    /// Removes the top file item
    pub fn pop_file(&mut self) -> Option<FileWork> {
        self.files.pop()
    }

    /// Returns true when there is no work left at all
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty() && self.files.is_empty()
    }
}
