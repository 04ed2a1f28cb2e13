use seesy_core::constants::{ALLOWED_IMAGE_CONTENT_TYPES, MAX_IMAGE_SIZE_BYTES};
use seesy_core::Config;
use std::path::Path;

/// Reasons an image is rejected before any I/O happens
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unsupported content type: {content_type}")]
    UnsupportedType { content_type: String },

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },
}

/// Image file validator
///
/// Checks the declared MIME type first, then the byte size. Pure: the same
/// inputs always give the same answer.
#[derive(Debug, Clone)]
pub struct ImageValidator {
    max_file_size: usize,
    allowed_content_types: Vec<String>,
}

impl ImageValidator {
    pub fn new(max_file_size: usize, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| ct.to_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_file_size_bytes,
            config.allowed_content_types.clone(),
        )
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate content type (case-insensitive)
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = content_type.trim().to_lowercase();

        if !self.allowed_content_types.iter().any(|ct| ct == &normalized) {
            return Err(ValidationError::UnsupportedType {
                content_type: content_type.to_string(),
            });
        }

        Ok(())
    }

    /// Validate file size. A file exactly at the limit is accepted.
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    pub fn validate(&self, content_type: &str, size: usize) -> Result<(), ValidationError> {
        self.validate_content_type(content_type)?;
        self.validate_file_size(size)?;
        Ok(())
    }
}

impl Default for ImageValidator {
    fn default() -> Self {
        Self::new(
            MAX_IMAGE_SIZE_BYTES,
            ALLOWED_IMAGE_CONTENT_TYPES
                .iter()
                .map(|ct| ct.to_string())
                .collect(),
        )
    }
}

/// Guess an image MIME type from a file name's extension.
pub fn content_type_for_file_name(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())?;

    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
