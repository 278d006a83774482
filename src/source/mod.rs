//! Source module for talking to the remote document service
//!
//! This module contains:
//! - The rate-gated HTTP client that every outbound call goes through
//! - The request budget tracked from response headers
//! - Wire models for folders, threads, users and paginated HTML

mod budget;
mod client;
mod models;

pub use budget::{Budget, RateBudget, ORGANIZATION_REMAINING_HEADER, USER_REMAINING_HEADER};
pub use client::{build_http_client, Blob, SourceClient, DEFAULT_SOURCE_URL};
pub use models::{
    seed_folder_ids, CurrentUser, FolderChild, FolderInfo, FolderResponse, ResponseMetadata,
    SeedKind, ThreadHtmlPage, ThreadMeta, ThreadResponse,
};
