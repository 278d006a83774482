//! Asset relocation extension
//!
//! Documents reference embedded images by a service-relative path
//! (`/blob/<thread>/<blob>`) that stops working once the document leaves
//! the source service. This extension downloads each such image through the
//! rate-gated client, hands it to an [`AssetStore`], and points the `<img>`
//! at the stored copy.

use crate::pipeline::extension::{Extension, RunContext};
use crate::pipeline::tree::HtmlNode;
use crate::ExportError;
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use url::Url;

/// File name assumed when an image has no usable `alt`
const DEFAULT_IMAGE_NAME: &str = "image.png";

const DEFAULT_EXTENSION: &str = "png";

/// Destination for relocated assets
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Stores the bytes under `key` and returns the public URL
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, ExportError>;
}

/// Stores assets in a local directory served under a public URL
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    directory: PathBuf,
    public_url: String,
}

impl LocalAssetStore {
    pub fn new(directory: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            public_url: public_url.into(),
        }
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, ExportError> {
        tokio::fs::create_dir_all(&self.directory).await?;
        tokio::fs::write(self.directory.join(key), bytes).await?;
        tracing::debug!("Stored asset {} ({}, {} bytes)", key, content_type, bytes.len());
        Ok(format!("{}/{}", self.public_url.trim_end_matches('/'), key))
    }
}

/// Rewrites `<img src="/blob/...">` to point at relocated copies
pub struct AssetRelocation {
    store: Box<dyn AssetStore>,
    pattern: Regex,
}

impl AssetRelocation {
    pub fn new(store: Box<dyn AssetStore>) -> Result<Self, ExportError> {
        let pattern = Regex::new(r"^/blob/(\w+)/(\w+)$").map_err(|e| ExportError::Extension {
            extension: "asset-relocation".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { store, pattern })
    }

    fn blob_ids<'a>(&self, src: &'a str) -> Option<(&'a str, &'a str)> {
        let captures = self.pattern.captures(src)?;
        Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
    }
}

#[async_trait]
impl Extension for AssetRelocation {
    fn name(&self) -> &str {
        "asset-relocation"
    }

    fn check(&self, node: &HtmlNode) -> bool {
        node.as_element()
            .filter(|el| el.name == "img")
            .and_then(|el| el.attr("src"))
            .is_some_and(|src| self.pattern.is_match(src))
    }

    async fn mutate(&self, node: &mut HtmlNode, ctx: &RunContext<'_>) -> Result<(), ExportError> {
        let Some(element) = node.as_element_mut() else {
            return Ok(());
        };
        let Some(src) = element.attr("src").map(str::to_string) else {
            return Ok(());
        };
        let Some((thread_id, blob_id)) = self.blob_ids(&src) else {
            return Ok(());
        };

        let name = element
            .attr("alt")
            .filter(|alt| !alt.trim().is_empty())
            .unwrap_or(DEFAULT_IMAGE_NAME)
            .to_string();

        let blob = ctx.client.blob(thread_id, blob_id).await?;

        let content_type = content_type_for_name(&name)
            .map(str::to_string)
            .or(blob.content_type)
            .unwrap_or_else(|| "image/png".to_string());
        let key = format!(
            "{}-{}.{}",
            thread_id,
            blob_id,
            extension_for(&name, &content_type)
        );

        let url = self.store.put(&key, &blob.bytes, &content_type).await?;
        tracing::info!("Relocated image {} to {}", src, url);
        element.set_attr("src", url);
        Ok(())
    }
}

/// Virtual-hosted-style URL of an object in an S3 bucket
pub fn s3_object_url(bucket: &str, region: &str, key: &str) -> String {
    let endpoint = format!("https://{}.s3.{}.amazonaws.com/", bucket, region);
    let Ok(mut url) = Url::parse(&endpoint) else {
        return format!("{}{}", endpoint, key);
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().extend(key.split('/'));
    }
    url.to_string()
}

/// Guesses a content type from a file name's extension
pub fn content_type_for_name(name: &str) -> Option<&'static str> {
    mime_guess::from_path(name).first_raw()
}

/// File extension for a stored image
///
/// The name's own extension is kept when it belongs to the content type,
/// otherwise the first registered extension is used. Content types that
/// are not images fall back to `png`.
pub fn extension_for(name: &str, content_type: &str) -> String {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !essence.starts_with("image/") {
        return DEFAULT_EXTENSION.to_string();
    }
    let Some(known) = mime_guess::get_mime_extensions_str(&essence) else {
        return DEFAULT_EXTENSION.to_string();
    };

    let own = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match own {
        Some(ext) if known.contains(&ext.as_str()) => ext,
        _ => known
            .first()
            .map(|ext| ext.to_string())
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
    }
}
