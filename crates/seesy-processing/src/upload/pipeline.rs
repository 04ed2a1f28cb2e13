//! Upload pipeline: validate → compress → store → resolve URL.
//!
//! Each call runs the stages in order and stops at the first failure. No
//! state survives a failed call; the caller retries from the start.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use seesy_core::Config;
use seesy_storage::{generate_object_key, Storage};

use super::types::{ImageFile, UploadedImage};
use crate::compression::{compress_image_async, CompressedImage, CompressionOptions};
use crate::error::ImageUploadError;
use crate::validator::ImageValidator;

/// Upload progress callback, receives a percentage in `0.0..=100.0`.
pub type ProgressCallback<'a> = &'a (dyn Fn(f64) + Send + Sync);

/// Forwards storage progress to the caller, never letting the value go down.
struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
    // f64 bits; ordering of non-negative floats matches their bit patterns
    highest: AtomicU64,
}

impl<'a> ProgressReporter<'a> {
    fn new(callback: Option<ProgressCallback<'a>>) -> Self {
        Self {
            callback,
            highest: AtomicU64::new(0f64.to_bits()),
        }
    }

    fn report(&self, percent: f64) {
        let Some(callback) = self.callback else {
            return;
        };
        if percent.is_nan() {
            return;
        }
        let percent = percent.clamp(0.0, 100.0);
        let previous = f64::from_bits(self.highest.fetch_max(percent.to_bits(), Ordering::AcqRel));
        callback(previous.max(percent));
    }

    /// Make sure the last reported value is 100.
    fn finish(&self) {
        if f64::from_bits(self.highest.load(Ordering::Acquire)) < 100.0 {
            self.report(100.0);
        }
    }
}

/// Validates, compresses and stores storefront images.
#[derive(Clone)]
pub struct ImageUploader {
    storage: Arc<dyn Storage>,
    validator: ImageValidator,
    compression: CompressionOptions,
}

impl ImageUploader {
    pub fn new(
        storage: Arc<dyn Storage>,
        validator: ImageValidator,
        compression: CompressionOptions,
    ) -> Self {
        Self {
            storage,
            validator,
            compression,
        }
    }

    pub fn from_config(storage: Arc<dyn Storage>, config: &Config) -> Self {
        Self::new(
            storage,
            ImageValidator::from_config(config),
            CompressionOptions::from_config(config),
        )
    }

    pub fn validator(&self) -> &ImageValidator {
        &self.validator
    }

    pub fn compression(&self) -> &CompressionOptions {
        &self.compression
    }

    /// Run the whole pipeline for one image and return its download URL.
    ///
    /// The object is stored under `{upload_path}/{timestamp_ms}_{file_name}`
    /// with the file name sanitized. Validation happens before any decoding
    /// or network traffic.
    pub async fn upload(
        &self,
        file: ImageFile,
        upload_path: &str,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> Result<UploadedImage, ImageUploadError> {
        tracing::debug!(
            file_name = %file.file_name,
            content_type = %file.content_type,
            size_bytes = file.size(),
            "Validating image"
        );
        self.validator.validate(&file.content_type, file.size())?;

        tracing::debug!(file_name = %file.file_name, "Compressing image");
        let compressed =
            compress_image_async(file.data, file.content_type, self.compression).await?;

        self.upload_compressed(&file.file_name, compressed, upload_path, on_progress)
            .await
    }

    /// Store an already compressed image.
    pub async fn upload_compressed(
        &self,
        file_name: &str,
        image: CompressedImage,
        upload_path: &str,
        on_progress: Option<ProgressCallback<'_>>,
    ) -> Result<UploadedImage, ImageUploadError> {
        let key = generate_object_key(upload_path, file_name);
        let size_bytes = image.data.len() as u64;
        let reporter = ProgressReporter::new(on_progress);
        let start = Instant::now();

        tracing::debug!(key = %key, size_bytes = size_bytes, "Uploading image");
        if let Err(e) = self
            .storage
            .upload_resumable(&key, image.content_type, image.data, &|progress| {
                reporter.report(progress.percent())
            })
            .await
        {
            tracing::error!(
                error = %e,
                key = %key,
                size_bytes = size_bytes,
                backend = %self.storage.backend_type(),
                "Image upload failed"
            );
            return Err(ImageUploadError::Transport);
        }
        reporter.finish();

        // The object stays in storage if this fails.
        let download_url = self.storage.download_url(&key).await.map_err(|e| {
            tracing::error!(
                error = %e,
                key = %key,
                backend = %self.storage.backend_type(),
                "Failed to resolve download URL after upload"
            );
            ImageUploadError::UrlResolution { key: key.clone() }
        })?;

        tracing::info!(
            key = %key,
            size_bytes = size_bytes,
            width = image.width,
            height = image.height,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Image uploaded"
        );

        Ok(UploadedImage {
            object_key: key,
            download_url,
            content_type: image.content_type.to_string(),
            size_bytes,
            width: image.width,
            height: image.height,
        })
    }
}
