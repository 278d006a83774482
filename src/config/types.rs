use crate::checkpoint::DEFAULT_CHECKPOINT_PATH;
use crate::sinks::notion::{DEFAULT_NOTION_URL, MAX_BLOCKS_PER_PAGE};
use crate::sinks::DEFAULT_EXPORT_ROOT;
use crate::source::{SeedKind, DEFAULT_SOURCE_URL};
use serde::Deserialize;

/// Main configuration structure for quip-export
///
/// Every section is optional; tokens are usually supplied on the command
/// line instead of being written to disk.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub checkpoint: CheckpointConfig,
    pub sinks: SinksConfig,
    pub filesystem: FilesystemConfig,
    pub notion: NotionConfig,
    pub assets: AssetsConfig,
}

/// Source service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Base URL of the source API
    #[serde(rename = "api-url")]
    pub api_url: String,

    /// Bearer token for the source API
    pub token: String,

    /// Folder sets that seed a fresh run
    pub seed: Vec<SeedKind>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_SOURCE_URL.to_string(),
            token: String::new(),
            seed: vec![SeedKind::Group],
        }
    }
}

/// Checkpoint persistence configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Path of the JSON checkpoint file
    pub path: String,

    /// Committed folder units between periodic saves (0 disables them)
    #[serde(rename = "save-every")]
    pub save_every: u32,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_CHECKPOINT_PATH.to_string(),
            save_every: 25,
        }
    }
}

/// Which sinks receive exported content
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinksConfig {
    pub enabled: Vec<String>,
}

impl Default for SinksConfig {
    fn default() -> Self {
        Self {
            enabled: vec!["fs".to_string()],
        }
    }
}

/// Filesystem sink configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilesystemConfig {
    /// Directory the folder tree is mirrored into
    pub root: String,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            root: DEFAULT_EXPORT_ROOT.to_string(),
        }
    }
}

/// Notion-style workspace sink configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotionConfig {
    #[serde(rename = "api-url")]
    pub api_url: String,

    pub token: String,

    /// Page that top-level folders are created under
    #[serde(rename = "root-page")]
    pub root_page: String,

    #[serde(rename = "max-blocks-per-page")]
    pub max_blocks_per_page: usize,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_NOTION_URL.to_string(),
            token: String::new(),
            root_page: String::new(),
            max_blocks_per_page: MAX_BLOCKS_PER_PAGE,
        }
    }
}

/// Where relocated assets are stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetBackend {
    /// A local directory served under `public-url`
    #[default]
    Local,

    /// An S3 bucket (requires the `s3` feature)
    S3,
}

/// Asset relocation configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub enabled: bool,

    pub backend: AssetBackend,

    /// Directory relocated assets are written to (local backend)
    pub directory: String,

    /// URL prefix the rewritten image sources point at; optional for S3,
    /// where it replaces the bucket endpoint
    #[serde(rename = "public-url")]
    pub public_url: String,

    /// S3 bucket name
    pub bucket: String,

    /// S3 bucket region
    pub region: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: AssetBackend::Local,
            directory: "assets".to_string(),
            public_url: String::new(),
            bucket: String::new(),
            region: String::new(),
        }
    }
}

impl Config {
    /// Returns true if the named sink is enabled
    pub fn sink_enabled(&self, name: &str) -> bool {
        self.sinks.enabled.iter().any(|s| s == name)
    }
}
