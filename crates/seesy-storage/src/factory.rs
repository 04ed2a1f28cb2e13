#[cfg(feature = "storage-firebase")]
use crate::FirebaseStorage;
#[cfg(feature = "storage-local")]
use crate::LocalStorage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use seesy_core::Config;
use std::sync::Arc;

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        #[cfg(feature = "storage-firebase")]
        StorageBackend::Firebase => {
            let bucket = config.firebase_storage_bucket.clone().ok_or_else(|| {
                StorageError::ConfigError("FIREBASE_STORAGE_BUCKET not configured".to_string())
            })?;

            let storage = FirebaseStorage::new(
                bucket,
                config.firebase_storage_base_url.clone(),
                config.firebase_auth_token.clone(),
            )?
            .with_chunk_size(config.upload_chunk_size_bytes);
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-firebase"))]
        StorageBackend::Firebase => Err(StorageError::ConfigError(
            "Firebase storage backend not available (storage-firebase feature not enabled)"
                .to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config.local_storage_path.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
            })?;
            let base_url = config.local_storage_base_url.clone().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
            })?;

            let storage = LocalStorage::new(base_path, base_url)
                .await?
                .with_chunk_size(config.upload_chunk_size_bytes);
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
