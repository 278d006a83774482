//! Wire models for the source service API

use crate::state::{ChildRef, FolderRecord};
use serde::{Deserialize, Serialize};

/// Which of the user's folder sets seed a fresh run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeedKind {
    Group,
    Shared,
    Private,
    Starred,
}

/// Response of the current-user endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentUser {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub group_folder_ids: Vec<String>,
    #[serde(default)]
    pub shared_folder_ids: Vec<String>,
    #[serde(default)]
    pub private_folder_id: Option<String>,
    #[serde(default)]
    pub starred_folder_id: Option<String>,
}

/// Picks the seed folder ids for the requested kinds
///
/// Kinds are applied in the given order and duplicates are dropped, keeping
/// the first occurrence.
pub fn seed_folder_ids(user: &CurrentUser, kinds: &[SeedKind]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for kind in kinds {
        let candidates: Vec<&String> = match kind {
            SeedKind::Group => user.group_folder_ids.iter().collect(),
            SeedKind::Shared => user.shared_folder_ids.iter().collect(),
            SeedKind::Private => user.private_folder_id.iter().collect(),
            SeedKind::Starred => user.starred_folder_id.iter().collect(),
        };
        for id in candidates {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
    }
    ids
}

/// Folder header returned with a folder read
#[derive(Debug, Clone, Deserialize)]
pub struct FolderInfo {
    pub id: String,
    #[serde(default)]
    pub title: String,
}

/// One child of a folder: either a sub-folder or a thread (document)
#[derive(Debug, Clone, Deserialize)]
pub struct FolderChild {
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub thread_id: Option<String>,
}

/// Response of the folder-read endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct FolderResponse {
    pub folder: FolderInfo,
    #[serde(default)]
    pub children: Vec<FolderChild>,
}

impl From<FolderResponse> for FolderRecord {
    fn from(response: FolderResponse) -> Self {
        let children = response
            .children
            .into_iter()
            .filter_map(|child| match (child.folder_id, child.thread_id) {
                (Some(folder_id), _) => Some(ChildRef::Folder(folder_id)),
                (None, Some(thread_id)) => Some(ChildRef::File(thread_id)),
                (None, None) => None,
            })
            .collect();

        FolderRecord {
            id: response.folder.id,
            title: response.folder.title,
            children,
        }
    }
}

/// Document metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMeta {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub created_usec: Option<i64>,
    #[serde(default)]
    pub updated_usec: Option<i64>,
}

/// Response of the document-metadata endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadResponse {
    pub thread: ThreadMeta,
}

/// Pagination metadata of the document-HTML endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// One page of document HTML
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadHtmlPage {
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub response_metadata: Option<ResponseMetadata>,
}

impl ThreadHtmlPage {
    /// Returns the cursor for the next page, if more content remains
    pub fn next_cursor(&self) -> Option<&str> {
        self.response_metadata
            .as_ref()
            .and_then(|meta| meta.next_cursor.as_deref())
            .filter(|cursor| !cursor.is_empty())
    }
}
