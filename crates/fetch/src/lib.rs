//! Requester-pays retrieval from the arXiv S3 source bucket.
//!
//! The source bucket (`s3://arxiv`) is requester-pays: every request must
//! opt in to being billed, so nothing here fetches implicitly. Credentials
//! are provided explicitly by the caller; retry with exponential back-off
//! is delegated to the SDK, and failures that survive it surface as
//! [`error::ErrorKind::Unavailable`] for the caller to treat as fatal to
//! that archive only.

pub mod error;

use crate::error::{ErrorKind, Result};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::types::RequestPayer;
use exn::ResultExt;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::instrument;

/// The manifest object indexing every bulk archive in the bucket.
pub const MANIFEST_KEY: &str = "src/arXiv_src_manifest.xml";

const DEFAULT_BUCKET: &str = "arxiv";
const DEFAULT_REGION: &str = "us-east-1";
/// Bulk archives run to multiple gigabytes; keep concurrent downloads low.
const DEFAULT_CONCURRENT_REQUESTS: usize = 4;

/// Handle to the requester-pays source bucket.
///
/// # Examples
///
/// ```no_run
/// use arxcat_fetch::SourceBucket;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let bucket = SourceBucket::new("access_key_id", "secret_access_key");
/// let manifest = bucket.fetch_manifest().await?;
/// let archive = bucket.fetch_archive("src/arXiv_src_9902_005.tar").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SourceBucket {
    client: Client,
    bucket: String,
    /// Rate limiter for concurrent S3 requests.
    rate_limiter: Arc<Semaphore>,
}

impl SourceBucket {
    /// Connect to the canonical `arxiv` bucket in `us-east-1`.
    #[must_use]
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self::with_bucket(DEFAULT_BUCKET, DEFAULT_REGION, key_id, key_secret)
    }

    /// Connect to a different bucket or region (mirrors, test fixtures).
    #[must_use]
    pub fn with_bucket(
        bucket: impl Into<String>,
        region: impl Into<String>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Self {
        let credentials = Credentials::new(key_id, key_secret, None, None, "arxcat-config");
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .credentials_provider(credentials)
            .region(Region::new(region.into()))
            // Exponential backoff (1 initial + 3 retries)
            .retry_config(RetryConfig::standard().with_max_attempts(4))
            .build();
        Self {
            client: Client::from_conf(config),
            bucket: bucket.into(),
            rate_limiter: Arc::new(Semaphore::new(DEFAULT_CONCURRENT_REQUESTS)),
        }
    }

    /// Download the bucket manifest.
    pub async fn fetch_manifest(&self) -> Result<Vec<u8>> {
        self.get(MANIFEST_KEY).await
    }

    /// Download one bulk archive by its object key
    /// (`src/arXiv_src_{yymm}_{seq}.tar`).
    pub async fn fetch_archive(&self, key: &str) -> Result<Vec<u8>> {
        self.get(key).await
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let _permit = self.acquire_permit().await;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .request_payer(RequestPayer::Requester)
            .send();
        let response = match request.await {
            Ok(response) => response,
            Err(err) => {
                let service = err.into_service_error();
                match service.is_no_such_key() {
                    true => exn::bail!(ErrorKind::NotFound(key.to_string())),
                    false => exn::bail!(ErrorKind::Unavailable(service.to_string())),
                }
            },
        };
        let bytes = response
            .body
            .collect()
            .await
            .or_raise(|| ErrorKind::Unavailable(format!("stream interrupted for {key}")))?;
        let bytes = bytes.into_bytes().to_vec();
        tracing::info!(size = bytes.len(), "downloaded object");
        Ok(bytes)
    }

    /// Acquire a rate limiter permit before making an S3 API call.
    async fn acquire_permit(&self) -> OwnedSemaphorePermit {
        // The semaphore is never closed.
        self.rate_limiter.clone().acquire_owned().await.unwrap_or_else(|_| unreachable!())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_key_is_under_src() {
        assert_eq!(MANIFEST_KEY, "src/arXiv_src_manifest.xml");
    }

    #[tokio::test]
    async fn construction_does_not_touch_network() {
        let bucket = SourceBucket::with_bucket("fixture", "us-east-1", "id", "secret");
        assert_eq!(bucket.bucket, "fixture");
        let _permit = bucket.acquire_permit().await;
    }
}
