//! Types for the upload pipeline.

use bytes::Bytes;
use serde::Serialize;

/// Raw image as picked by the admin, before validation.
#[derive(Clone, Debug)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl ImageFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A stored image. `download_url` is what catalog records keep.
#[derive(Clone, Debug, Serialize)]
pub struct UploadedImage {
    pub object_key: String,
    pub download_url: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub width: u32,
    pub height: u32,
}
