use crate::traits::{Storage, StorageError, StorageResult, UploadProgress};
use crate::urls::{encode_key, same_origin};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use seesy_core::constants::UPLOAD_CHUNK_SIZE_BYTES;
use serde::Deserialize;

const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

/// Object metadata returned by the Firebase Storage REST API.
#[derive(Debug, Deserialize)]
struct ObjectMetadata {
    #[serde(rename = "downloadTokens")]
    download_tokens: Option<String>,
}

/// Firebase Storage implementation (REST API)
///
/// Uploads use the resumable protocol: one `start` request opens a session,
/// then the payload is sent in chunks, the last one finalizing the object.
/// Download URLs embed the object's download token and stay valid until the
/// object is deleted or the token revoked.
#[derive(Clone)]
pub struct FirebaseStorage {
    client: Client,
    bucket: String,
    base_url: String,
    auth_token: Option<String>,
    chunk_size: usize,
}

impl FirebaseStorage {
    /// Create a new FirebaseStorage instance
    ///
    /// # Arguments
    /// * `bucket` - Storage bucket (e.g., "seesy-shop.firebasestorage.app")
    /// * `base_url` - API endpoint, "https://firebasestorage.googleapis.com" or an emulator
    /// * `auth_token` - Firebase ID token of the signed-in admin, sent as `Authorization: Firebase <token>`
    pub fn new(
        bucket: String,
        base_url: String,
        auth_token: Option<String>,
    ) -> StorageResult<Self> {
        if bucket.trim().is_empty() {
            return Err(StorageError::ConfigError(
                "Firebase storage bucket is empty".to_string(),
            ));
        }

        let client = Client::builder().build().map_err(|e| {
            StorageError::ConfigError(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(FirebaseStorage {
            client,
            bucket,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token,
            chunk_size: UPLOAD_CHUNK_SIZE_BYTES,
        })
    }

    /// Send uploads in chunks of `chunk_size` bytes.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    fn bucket_url(&self) -> String {
        format!("{}/v0/b/{}/o", self.base_url, self.bucket)
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.bucket_url(), encode_key(key))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.header("Authorization", format!("Firebase {}", token)),
            None => request,
        }
    }

    async fn error_text(response: Response) -> String {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        format!("{} - {}", status, body)
    }

    /// Open a resumable upload session and return its URL.
    async fn start_session(
        &self,
        key: &str,
        content_type: &str,
        total: usize,
    ) -> StorageResult<String> {
        let url = format!("{}?name={}", self.bucket_url(), encode_key(key));

        let response = self
            .authorize(self.client.post(&url))
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", total.to_string())
            .header("X-Goog-Upload-Header-Content-Type", content_type)
            .json(&serde_json::json!({ "name": key, "contentType": content_type }))
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::UploadFailed(Self::error_text(response).await));
        }

        response
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                StorageError::UploadFailed("No upload session URL returned".to_string())
            })
    }

    /// Run a whole resumable session and return the number of chunks sent.
    async fn send_chunks(
        &self,
        key: &str,
        content_type: &str,
        data: &Bytes,
        on_progress: &(dyn Fn(UploadProgress) + Send + Sync),
    ) -> StorageResult<u32> {
        let total = data.len();
        let session_url = self.start_session(key, content_type, total).await?;

        let mut offset = 0usize;
        let mut chunks = 0u32;
        loop {
            let end = (offset + self.chunk_size).min(total);
            let is_last = end == total;
            let command = if is_last { "upload, finalize" } else { "upload" };

            let response = self
                .authorize(self.client.post(&session_url))
                .header("X-Goog-Upload-Command", command)
                .header("X-Goog-Upload-Offset", offset.to_string())
                .body(data.slice(offset..end))
                .send()
                .await
                .map_err(|e| StorageError::UploadFailed(e.to_string()))?;

            if !response.status().is_success() {
                return Err(StorageError::UploadFailed(format!(
                    "chunk at offset {}: {}",
                    offset,
                    Self::error_text(response).await
                )));
            }

            offset = end;
            chunks += 1;
            on_progress(UploadProgress {
                bytes_transferred: offset as u64,
                total_bytes: total as u64,
            });

            if is_last {
                return Ok(chunks);
            }
        }
    }
}

#[async_trait]
impl Storage for FirebaseStorage {
    async fn upload_resumable(
        &self,
        key: &str,
        content_type: &str,
        data: Bytes,
        on_progress: &(dyn Fn(UploadProgress) + Send + Sync),
    ) -> StorageResult<()> {
        let total = data.len();
        let start = std::time::Instant::now();

        let result = self
            .send_chunks(key, content_type, &data, on_progress)
            .await;

        match result {
            Ok(chunks) => {
                tracing::info!(
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = total,
                    chunks = chunks,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Firebase upload successful"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = total,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Firebase upload failed"
                );
                Err(e)
            }
        }
    }

    async fn download_url(&self, key: &str) -> StorageResult<String> {
        let object_url = self.object_url(key);

        let response = self
            .authorize(self.client.get(&object_url))
            .send()
            .await
            .map_err(|e| StorageError::UrlUnavailable(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(StorageError::NotFound(key.to_string())),
            status if !status.is_success() => {
                return Err(StorageError::UrlUnavailable(Self::error_text(response).await));
            }
            _ => {}
        }

        let metadata: ObjectMetadata = response
            .json()
            .await
            .map_err(|e| StorageError::UrlUnavailable(format!("Invalid metadata: {}", e)))?;

        let token = metadata
            .download_tokens
            .as_deref()
            .and_then(|tokens| tokens.split(',').map(str::trim).find(|t| !t.is_empty()))
            .ok_or_else(|| {
                StorageError::UrlUnavailable(format!("No download token for {}", key))
            })?;

        Ok(format!("{}?alt=media&token={}", object_url, token))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let start = std::time::Instant::now();

        let response = self
            .authorize(self.client.delete(self.object_url(key)))
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(StorageError::NotFound(key.to_string())),
            status if !status.is_success() => {
                Err(StorageError::DeleteFailed(Self::error_text(response).await))
            }
            _ => {
                tracing::info!(
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Firebase delete successful"
                );
                Ok(())
            }
        }
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let response = self
            .authorize(self.client.get(self.object_url(key)))
            .send()
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Err(StorageError::BackendError(Self::error_text(response).await)),
        }
    }

    fn owns_url(&self, url: &str) -> bool {
        same_origin(url, &self.base_url)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Firebase
    }
}
