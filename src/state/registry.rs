/// Registry of folders fetched during a run
///
/// Every folder id appears at most once. The synthetic root record is
/// inserted at construction and acts as the parent of the seed folders.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Id of the synthetic root folder
pub const ROOT_FOLDER_ID: &str = "root";

/// A child entry of a remote folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildRef {
    Folder(String),
    File(String),
}

/// An immutable snapshot of a fetched folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRecord {
    pub id: String,
    pub title: String,
    pub children: Vec<ChildRef>,
}

impl FolderRecord {
    /// Creates the synthetic root record with the given seed folders
    pub fn root(seed_folder_ids: &[String]) -> Self {
        Self {
            id: ROOT_FOLDER_ID.to_string(),
            title: String::new(),
            children: seed_folder_ids
                .iter()
                .cloned()
                .map(ChildRef::Folder)
                .collect(),
        }
    }

    /// Returns true if this is the synthetic root
    pub fn is_root(&self) -> bool {
        self.id == ROOT_FOLDER_ID
    }
}

/// Mapping from folder id to its fetched record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitedRegistry {
    folders: BTreeMap<String, FolderRecord>,
}

impl VisitedRegistry {
    /// Creates a registry containing only the root record
    pub fn new(root: FolderRecord) -> Self {
        let mut folders = BTreeMap::new();
        folders.insert(root.id.clone(), root);
        Self { folders }
    }

    /// Returns true if the folder has already been fetched
    pub fn contains(&self, folder_id: &str) -> bool {
        self.folders.contains_key(folder_id)
    }

    /// Inserts a record, refusing duplicates
    ///
    /// Returns `false` and leaves the stored record untouched if the id is
    /// already present.
    pub fn insert(&mut self, record: FolderRecord) -> bool {
        if self.folders.contains_key(&record.id) {
            return false;
        }
        self.folders.insert(record.id.clone(), record);
        true
    }

    /// Gets a record by id
    pub fn get(&self, folder_id: &str) -> Option<&FolderRecord> {
        self.folders.get(folder_id)
    }

    /// Gets the root record
    pub fn root(&self) -> Option<&FolderRecord> {
        self.folders.get(ROOT_FOLDER_ID)
    }

    /// Number of folders, including the root
    pub fn len(&self) -> usize {
        self.folders.len()
    }

    /// Always false once constructed, the root is never removed
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Iterates over folder ids in sorted order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.folders.keys().map(String::as_str)
    }
}

impl Default for VisitedRegistry {
    fn default() -> Self {
        Self::new(FolderRecord::root(&[]))
    }
}
