//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download URL unavailable: {0}")]
    UrlUnavailable(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Invalid download URL: {0}")]
    InvalidUrl(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Snapshot of a resumable write, reported after every acknowledged chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_transferred: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    /// `bytes_transferred / total_bytes * 100`, clamped to `0.0..=100.0`.
    ///
    /// An empty object counts as fully transferred.
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        (self.bytes_transferred as f64 / self.total_bytes as f64 * 100.0).clamp(0.0, 100.0)
    }
}

/// Storage abstraction trait
///
/// The image pipeline talks to object storage only through this trait, so the
/// Firebase backend and the local filesystem backend are interchangeable.
///
/// Writing an object and minting its download URL are separate calls: a write
/// can succeed while the URL lookup fails, and callers report those two
/// failures differently.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` under `key` in chunks.
    ///
    /// `on_progress` is invoked after every acknowledged chunk with a
    /// non-decreasing `bytes_transferred`; the last call reports the full size.
    async fn upload_resumable(
        &self,
        key: &str,
        content_type: &str,
        data: Bytes,
        on_progress: &(dyn Fn(UploadProgress) + Send + Sync),
    ) -> StorageResult<()>;

    /// Resolve the durable public download URL of an existing object.
    async fn download_url(&self, key: &str) -> StorageResult<String>;

    /// Delete an object by key. Missing objects report `NotFound`.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Whether `url` was issued by this backend (same scheme, host and port).
    fn owns_url(&self, url: &str) -> bool;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
