//! Notion-style workspace sink
//!
//! Every folder becomes a page under its parent's page. Every document
//! becomes a page of content blocks. Documents with more blocks than a
//! single request accepts are split into numbered parts under a container
//! page carrying the document title.

mod blocks;

pub use blocks::{blocks_from_tree, rich_text};

use crate::sinks::paths::PathCache;
use crate::sinks::traits::{ExportedDocument, Sink, SinkError, SinkResult};
use crate::source::build_http_client;
use crate::state::FolderRecord;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

/// Default API base URL
pub const DEFAULT_NOTION_URL: &str = "https://api.notion.com";

/// API version sent with every request
pub const NOTION_VERSION: &str = "2022-06-28";

/// Most children the API accepts when creating a page
pub const MAX_BLOCKS_PER_PAGE: usize = 100;

/// How a document's blocks are laid out across pages
#[derive(Debug, Clone, PartialEq)]
pub enum PagePlan {
    /// One page holding every block
    Single { title: String, blocks: Vec<Value> },

    /// A container page with ordered part pages beneath it
    Split {
        container_title: String,
        parts: Vec<(String, Vec<Value>)>,
    },
}

/// Decides how to lay out `blocks` given the per-page ceiling
///
/// A ceiling of 0 is treated as 1.
pub fn plan_pages(title: &str, blocks: Vec<Value>, max_blocks: usize) -> PagePlan {
    let max_blocks = max_blocks.max(1);
    if blocks.len() <= max_blocks {
        return PagePlan::Single {
            title: title.to_string(),
            blocks,
        };
    }

    let chunks: Vec<Vec<Value>> = blocks.chunks(max_blocks).map(<[Value]>::to_vec).collect();
    let total = chunks.len();
    let parts = chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| (format!("{} (part {}/{})", title, i + 1, total), chunk))
        .collect();

    PagePlan::Split {
        container_title: title.to_string(),
        parts,
    }
}

#[derive(Debug, Deserialize)]
struct CreatedPage {
    id: String,
}

pub struct NotionSink {
    http: Client,
    api_url: String,
    token: String,
    root_page: String,
    max_blocks: usize,
    paths: PathCache,
    pages_created: u64,
}

impl NotionSink {
    pub fn new(
        api_url: &str,
        token: impl Into<String>,
        root_page: impl Into<String>,
        max_blocks: usize,
    ) -> SinkResult<Self> {
        Ok(Self {
            http: build_http_client()?,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.into(),
            root_page: root_page.into(),
            max_blocks: max_blocks.clamp(1, MAX_BLOCKS_PER_PAGE),
            paths: PathCache::new(),
            pages_created: 0,
        })
    }

    /// Number of pages created by this sink instance
    pub fn pages_created(&self) -> u64 {
        self.pages_created
    }

    /// Page id a folder or document was exported to
    pub fn page_for(&self, id: &str) -> Option<&str> {
        self.paths.get(id)
    }

    /// Page to place children of `parent` under
    fn parent_page(&self, parent: &FolderRecord) -> String {
        if parent.is_root() {
            return self.root_page.clone();
        }
        match self.paths.get(&parent.id) {
            Some(page) => page.to_string(),
            None => {
                tracing::warn!(
                    "No page known for folder {}, placing content under the root page",
                    parent.id
                );
                self.root_page.clone()
            }
        }
    }

    /// Creates a page and returns its id
    async fn create_page(
        &mut self,
        parent_page: &str,
        title: &str,
        children: Vec<Value>,
    ) -> SinkResult<String> {
        let body = json!({
            "parent": { "type": "page_id", "page_id": parent_page },
            "properties": {
                "title": { "title": [ { "text": { "content": title } } ] }
            },
            "children": children,
        });

        let response = self
            .http
            .post(format!("{}/v1/pages", self.api_url))
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let created: CreatedPage = response.json().await?;
        self.pages_created += 1;
        tracing::debug!("Created page {} ({})", title, created.id);
        Ok(created.id)
    }
}

#[async_trait]
impl Sink for NotionSink {
    fn id(&self) -> &str {
        "notion"
    }

    async fn on_folder_discovered(
        &mut self,
        folder: &FolderRecord,
        parent: &FolderRecord,
    ) -> SinkResult<()> {
        if self.paths.contains(&folder.id) {
            tracing::debug!("Folder {} already exported, skipping", folder.id);
            return Ok(());
        }

        let parent_page = self.parent_page(parent);
        let page = self.create_page(&parent_page, &folder.title, Vec::new()).await?;
        self.paths.insert(folder.id.clone(), page);
        Ok(())
    }

    async fn on_file_discovered(
        &mut self,
        document: &ExportedDocument,
        parent: &FolderRecord,
    ) -> SinkResult<()> {
        if self.paths.contains(document.id()) {
            tracing::debug!("Document {} already exported, skipping", document.id());
            return Ok(());
        }

        let parent_page = self.parent_page(parent);
        let blocks = blocks_from_tree(&document.tree);

        let page = match plan_pages(document.title(), blocks, self.max_blocks) {
            PagePlan::Single { title, blocks } => {
                self.create_page(&parent_page, &title, blocks).await?
            }
            PagePlan::Split {
                container_title,
                parts,
            } => {
                tracing::info!(
                    "Splitting {} into {} pages",
                    container_title,
                    parts.len()
                );
                let container = self
                    .create_page(&parent_page, &container_title, Vec::new())
                    .await?;
                for (title, blocks) in parts {
                    self.create_page(&container, &title, blocks).await?;
                }
                container
            }
        };

        self.paths.insert(document.id().to_string(), page);
        Ok(())
    }

    fn save_checkpoint(&self) -> SinkResult<Value> {
        self.paths.to_checkpoint()
    }

    fn load_checkpoint(&mut self, data: Value) -> SinkResult<()> {
        self.paths = PathCache::from_checkpoint(data)?;
        Ok(())
    }
}
