//! S3 asset storage
//!
//! Relocated images are uploaded with `PutObject` under their key at the
//! bucket root. Credentials come from the default AWS provider chain
//! (`AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY`, profiles, instance roles).

use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use crate::pipeline::assets::{s3_object_url, AssetStore};
use crate::ExportError;
use async_trait::async_trait;

/// Uploads relocated assets to an S3 bucket
pub struct S3AssetStore {
    client: Client,
    bucket: String,
    region: String,
    public_url: Option<String>,
}

impl S3AssetStore {
    /// Create a store around an existing client
    pub fn new(client: Client, bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            region: region.into(),
            public_url: None,
        }
    }

    /// Create a store for `bucket` in `region` using the default credential chain
    pub async fn connect(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        let region = region.into();
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;
        Self::new(Client::new(&config), bucket, region)
    }

    /// Serve uploaded objects from `public_url` (a CDN in front of the
    /// bucket) instead of the bucket's own endpoint
    pub fn with_public_url(mut self, public_url: impl Into<String>) -> Self {
        let public_url = public_url.into();
        self.public_url = (!public_url.trim().is_empty()).then_some(public_url);
        self
    }

    fn url_for(&self, key: &str) -> String {
        match &self.public_url {
            Some(base) => format!("{}/{}", base.trim_end_matches('/'), key),
            None => s3_object_url(&self.bucket, &self.region, key),
        }
    }
}

#[async_trait]
impl AssetStore for S3AssetStore {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String, ExportError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes.to_vec()))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| ExportError::AssetUpload {
                key: key.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        tracing::debug!(
            "Uploaded {} ({}, {} bytes) to s3://{}/{}",
            key,
            content_type,
            bytes.len(),
            self.bucket,
            key
        );
        Ok(self.url_for(key))
    }
}
