//! Extension pipeline applied to every fetched document
//!
//! This module contains:
//! - An owned HTML tree that extensions can rewrite
//! - The `Extension` trait and the `Pipeline` that runs extensions
//! - The asset relocation extension for embedded images, with local and
//!   (behind the `s3` feature) S3 storage

mod assets;
mod extension;
#[cfg(feature = "s3")]
mod s3;
mod tree;

pub use assets::{
    content_type_for_name, extension_for, s3_object_url, AssetRelocation, AssetStore,
    LocalAssetStore,
};
#[cfg(feature = "s3")]
pub use s3::S3AssetStore;
pub use extension::{Extension, Pipeline, ProcessedDocument, RunContext};
pub use tree::{Element, HtmlNode, HtmlTree};
