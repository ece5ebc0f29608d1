//! Storage module for report images
//!
//! Defines the `ImageStore` seam used by report ingestion and the
//! MinIO/S3-compatible implementation behind it.

mod minio_client;

use async_trait::async_trait;

use crate::core::error::AppError;

pub use minio_client::MinIOClient;

/// An image persisted out-of-band
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// Object key inside the store, used for cleanup
    pub key: String,
    /// URL recorded on the report
    pub url: String,
}

/// Object store for images attached to reports.
///
/// Failures are reported as `AppError::Storage`.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store `data` under `path` (relative to the public area) and return
    /// where it ended up.
    async fn put(&self, path: &str, data: Vec<u8>, content_type: &str)
        -> Result<StoredImage, AppError>;

    /// Remove a previously stored object
    async fn remove(&self, key: &str) -> Result<(), AppError>;
}
