//! Shared fixtures for pipeline tests.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use seesy_storage::{
    LocalStorage, Storage, StorageBackend, StorageError, StorageResult, UploadProgress,
};
use tempfile::TempDir;

pub const BASE_URL: &str = "http://localhost:9199";

/// Local storage rooted in a temp directory that lives as long as this value.
pub struct TestStorage {
    pub temp_dir: TempDir,
    pub storage: Arc<LocalStorage>,
}

impl TestStorage {
    pub async fn new(chunk_size: usize) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let storage = LocalStorage::new(temp_dir.path(), BASE_URL.to_string())
            .await
            .expect("Failed to create local storage")
            .with_chunk_size(chunk_size);
        Self {
            temp_dir,
            storage: Arc::new(storage),
        }
    }

    pub fn dyn_storage(&self) -> Arc<dyn Storage> {
        self.storage.clone()
    }
}

/// Pseudo-random RGB noise; barely compressible, so the encoded file is large.
pub fn noise_image(width: u32, height: u32, seed: u32) -> DynamicImage {
    let mut state = seed.max(1);
    let img = ImageBuffer::from_fn(width, height, |_, _| {
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xFF) as u8
        };
        Rgb([next(), next(), next()])
    });
    DynamicImage::ImageRgb8(img)
}

/// JPEG of about 1 MiB.
pub fn large_jpeg() -> Vec<u8> {
    let mut buffer = Vec::new();
    noise_image(1024, 768, 7)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, 75))
        .expect("Failed to encode JPEG fixture");
    buffer
}

pub fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format)
        .expect("Failed to encode fixture");
    buffer
}

/// Storage double that fails selected operations and counts calls.
#[derive(Default)]
pub struct FailingStorage {
    pub fail_upload: bool,
    pub fail_download_url: bool,
    pub fail_delete: bool,
    pub uploads: AtomicUsize,
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl Storage for FailingStorage {
    async fn upload_resumable(
        &self,
        _key: &str,
        _content_type: &str,
        data: Bytes,
        on_progress: &(dyn Fn(UploadProgress) + Send + Sync),
    ) -> StorageResult<()> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_upload {
            return Err(StorageError::UploadFailed(
                "connection reset by peer".to_string(),
            ));
        }
        on_progress(UploadProgress {
            bytes_transferred: data.len() as u64,
            total_bytes: data.len() as u64,
        });
        Ok(())
    }

    async fn download_url(&self, key: &str) -> StorageResult<String> {
        if self.fail_download_url {
            return Err(StorageError::UrlUnavailable(format!("No download token for {}", key)));
        }
        Ok(format!(
            "{}/o/{}?alt=media",
            BASE_URL,
            urlencoding_key(key)
        ))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        if self.fail_delete {
            return Err(StorageError::DeleteFailed("permission denied".to_string()));
        }
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }

    async fn exists(&self, _key: &str) -> StorageResult<bool> {
        Ok(false)
    }

    fn owns_url(&self, url: &str) -> bool {
        url.starts_with(BASE_URL)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

fn urlencoding_key(key: &str) -> String {
    key.replace('/', "%2F")
}
