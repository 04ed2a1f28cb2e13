use crate::keys::validate_key;
use crate::traits::{Storage, StorageError, StorageResult, UploadProgress};
use crate::urls::{encode_key, same_origin};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use seesy_core::constants::UPLOAD_CHUNK_SIZE_BYTES;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Local filesystem storage implementation
///
/// Objects live under `base_path/{key}` and are served from
/// `{base_url}/o/{encoded key}?alt=media`, the same URL shape the Firebase
/// backend issues, so the deletion path works unchanged in development.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    chunk_size: usize,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for object storage (e.g., "/var/lib/seesy/storage")
    /// * `base_url` - Base URL for serving objects (e.g., "http://localhost:9199")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url: base_url.trim_end_matches('/').to_string(),
            chunk_size: UPLOAD_CHUNK_SIZE_BYTES,
        })
    }

    /// Write in chunks of `chunk_size` bytes (progress is reported per chunk).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Convert storage key to filesystem path with security validation
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    /// Generate public URL for an object
    fn generate_url(&self, key: &str) -> String {
        format!("{}/o/{}?alt=media", self.base_url, encode_key(key))
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload_resumable(
        &self,
        key: &str,
        _content_type: &str,
        data: Bytes,
        on_progress: &(dyn Fn(UploadProgress) + Send + Sync),
    ) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        let total_bytes = data.len() as u64;

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let mut bytes_transferred = 0u64;
        for chunk in data.chunks(self.chunk_size) {
            file.write_all(chunk).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to write file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            bytes_transferred += chunk.len() as u64;
            on_progress(UploadProgress {
                bytes_transferred,
                total_bytes,
            });
        }

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        if total_bytes == 0 {
            on_progress(UploadProgress {
                bytes_transferred: 0,
                total_bytes: 0,
            });
        }

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = total_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn download_url(&self, key: &str) -> StorageResult<String> {
        let path = self.key_to_path(key)?;

        if !fs::try_exists(&path).await? {
            return Err(StorageError::NotFound(key.to_string()));
        }

        Ok(self.generate_url(key))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&path).await? {
            return Err(StorageError::NotFound(key.to_string()));
        }

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::try_exists(&path).await?)
    }

    fn owns_url(&self, url: &str) -> bool {
        same_origin(url, &self.base_url) && url.starts_with(&self.base_url)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
