//! Rate-gated HTTP client for the source service
//!
//! Every outbound call goes through [`SourceClient::request`], which:
//! - Refuses to issue the call once either request budget is exhausted
//! - Updates the budgets from the rate-limit headers of every response
//! - Maps transport failures and non-2xx statuses to typed errors

use crate::source::budget::RateBudget;
use crate::source::models::{
    CurrentUser, FolderResponse, ThreadHtmlPage, ThreadMeta, ThreadResponse,
};
use crate::state::FolderRecord;
use crate::ExportError;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use url::Url;

/// Default base URL of the source service
pub const DEFAULT_SOURCE_URL: &str = "https://platform.quip.com";

/// Longest error body kept in a protocol error message
const MAX_ERROR_BODY: usize = 512;

/// A downloaded binary asset
#[derive(Debug, Clone)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Builds the underlying HTTP client
///
/// Only a connect timeout is set. A stalled request stalls the run, there is
/// nothing else to schedule.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Client for the source service that honours its request budgets
pub struct SourceClient {
    http: Client,
    base_url: Url,
    token: String,
    budget: Mutex<RateBudget>,
    requests_sent: AtomicU64,
}

impl SourceClient {
    /// Creates a client for the given base URL and bearer token
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self, ExportError> {
        let http = build_http_client().map_err(|source| ExportError::Transport {
            endpoint: base_url.to_string(),
            source,
        })?;

        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            token: token.into(),
            budget: Mutex::new(RateBudget::unbounded()),
            requests_sent: AtomicU64::new(0),
        })
    }

    /// Returns a copy of the current budget
    pub fn budget(&self) -> RateBudget {
        *self.budget.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Overrides the current budget
    pub fn set_budget(&self, budget: RateBudget) {
        *self.budget.lock().unwrap_or_else(PoisonError::into_inner) = budget;
    }

    /// Number of requests that actually reached the network
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent.load(Ordering::Relaxed)
    }

    /// Issues a GET request against the source service
    ///
    /// # Errors
    ///
    /// * `RateLimitExhausted` - a budget is at zero; the network is not touched
    /// * `Transport` - the request could not be completed
    /// * `Protocol` - the service answered with a non-success status
    pub async fn request(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Response, ExportError> {
        if let Some(budget) = self.budget().exhausted() {
            tracing::warn!("{} rate limit hit, refusing request to {}", budget, endpoint);
            return Err(ExportError::RateLimitExhausted { budget });
        }

        let url = self.base_url.join(endpoint)?;
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|source| ExportError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;
        self.requests_sent.fetch_add(1, Ordering::Relaxed);

        {
            let mut budget = self.budget.lock().unwrap_or_else(PoisonError::into_inner);
            if budget.update_from_headers(response.headers()) {
                tracing::debug!(
                    "Rate budget: user={:?} organization={:?}",
                    budget.user_remaining,
                    budget.organization_remaining
                );
            } else {
                tracing::debug!("No rate limit headers on response from {}", endpoint);
            }
        }

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(ExportError::Protocol {
                endpoint: endpoint.to_string(),
                status: Some(status.as_u16()),
                message: format!("HTTP {}: {}", status, body),
            });
        }

        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ExportError> {
        let response = self.request(endpoint, query).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ExportError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        serde_json::from_slice(&bytes).map_err(|e| ExportError::Protocol {
            endpoint: endpoint.to_string(),
            status: None,
            message: format!("Malformed response body: {}", e),
        })
    }

    /// Fetches the authenticated user, whose folder ids seed a fresh run
    pub async fn current_user(&self) -> Result<CurrentUser, ExportError> {
        self.get_json("/1/users/current", &[]).await
    }

    /// Fetches a folder and its children
    pub async fn read_folder(&self, folder_id: &str) -> Result<FolderRecord, ExportError> {
        let response: FolderResponse = self
            .get_json(&format!("/1/folders/{}", folder_id), &[])
            .await?;
        Ok(response.into())
    }

    /// Fetches document metadata
    pub async fn thread(&self, thread_id: &str) -> Result<ThreadMeta, ExportError> {
        let response: ThreadResponse = self
            .get_json(&format!("/1/threads/{}", thread_id), &[])
            .await?;
        Ok(response.thread)
    }

    /// Fetches the complete HTML of a document
    ///
    /// Pages are requested in a loop and concatenated in order until the
    /// service stops returning a cursor.
    pub async fn thread_html(&self, thread_id: &str) -> Result<String, ExportError> {
        let endpoint = format!("/2/threads/{}/html", thread_id);
        let mut html = String::new();
        let mut cursor: Option<String> = None;
        let mut seen_cursors = HashSet::new();

        loop {
            let page: ThreadHtmlPage = match cursor.as_deref() {
                Some(c) => self.get_json(&endpoint, &[("cursor", c)]).await?,
                None => self.get_json(&endpoint, &[]).await?,
            };
            html.push_str(&page.html);

            match page.next_cursor() {
                Some(next) => {
                    if !seen_cursors.insert(next.to_string()) {
                        return Err(ExportError::Protocol {
                            endpoint,
                            status: None,
                            message: format!("Cursor {} returned twice", next),
                        });
                    }
                    cursor = Some(next.to_string());
                }
                None => break,
            }
        }

        Ok(html)
    }

    /// Downloads a binary asset embedded in a document
    pub async fn blob(&self, thread_id: &str, blob_id: &str) -> Result<Blob, ExportError> {
        let endpoint = format!("/1/blob/{}/{}", thread_id, blob_id);
        let response = self.request(&endpoint, &[]).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|source| ExportError::Transport { endpoint, source })?;

        Ok(Blob {
            bytes: bytes.to_vec(),
            content_type,
        })
    }
}
