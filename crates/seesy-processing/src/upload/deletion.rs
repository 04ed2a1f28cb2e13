use std::sync::Arc;

use seesy_storage::{object_key_from_url, Storage, StorageError};

use crate::error::ImageUploadError;

/// Removes stored images given the download URL a catalog record holds.
///
/// Only a URL that cannot be parsed, or that another host issued, is
/// reported to the caller. Storage failures are logged and dropped, so a
/// missing or already deleted object never blocks a catalog edit.
#[derive(Clone)]
pub struct ImageDeleter {
    storage: Arc<dyn Storage>,
}

impl ImageDeleter {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Whether `url` points into the configured storage backend.
    pub fn owns_url(&self, url: &str) -> bool {
        self.storage.owns_url(url)
    }

    pub async fn delete(&self, download_url: &str) -> Result<(), ImageUploadError> {
        // The key parser ignores the host
        if !self.owns_url(download_url) {
            tracing::debug!(url = %download_url, "URL not issued by the configured storage");
            return Err(ImageUploadError::InvalidUrl(download_url.to_string()));
        }

        let key = object_key_from_url(download_url).map_err(|e| {
            tracing::debug!(error = %e, url = %download_url, "Not a storage download URL");
            ImageUploadError::InvalidUrl(download_url.to_string())
        })?;

        match self.storage.delete(&key).await {
            Ok(()) => {
                tracing::info!(key = %key, "Image deleted");
            }
            Err(StorageError::NotFound(_)) => {
                tracing::debug!(key = %key, "Image already deleted");
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    key = %key,
                    backend = %self.storage.backend_type(),
                    "Image deletion failed, ignoring"
                );
            }
        }

        Ok(())
    }

    /// Delete the previous asset of a record whose image changed.
    ///
    /// Does nothing when `old_url` is empty, unchanged, or not one of ours.
    /// Returns whether a deletion was attempted.
    pub async fn replace(&self, old_url: &str, new_url: &str) -> bool {
        if old_url.is_empty() || old_url == new_url || !self.owns_url(old_url) {
            return false;
        }

        if let Err(e) = self.delete(old_url).await {
            tracing::debug!(error = %e, url = %old_url, "Skipped deletion of previous image");
        }
        true
    }

    /// Delete the asset of a record that is being removed.
    pub async fn remove(&self, url: &str) -> bool {
        self.replace(url, "").await
    }
}
