//! Errors surfaced by the image pipeline.
//!
//! Display strings are for logs. Anything shown to a shop admin goes through
//! [`ErrorMetadata::client_message`], which is in French.

use seesy_core::{ErrorMetadata, LogLevel};

use crate::compression::CompressionError;
use crate::validator::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum ImageUploadError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// The write to storage failed. The cause is logged where it happens.
    #[error("Image upload failed")]
    Transport,

    /// The object was written but no download URL could be obtained for it.
    #[error("Failed to resolve download URL for {key}")]
    UrlResolution { key: String },

    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),
}

impl From<CompressionError> for ImageUploadError {
    fn from(err: CompressionError) -> Self {
        match err {
            CompressionError::Decode(msg) => ImageUploadError::Decode(msg),
            CompressionError::Encode(msg) => ImageUploadError::Encode(msg),
        }
    }
}

/// (error_code, is_recoverable, log_level)
fn static_metadata(err: &ImageUploadError) -> (&'static str, bool, LogLevel) {
    match err {
        ImageUploadError::Validation(ValidationError::UnsupportedType { .. }) => {
            ("UNSUPPORTED_TYPE", true, LogLevel::Debug)
        }
        ImageUploadError::Validation(ValidationError::FileTooLarge { .. }) => {
            ("FILE_TOO_LARGE", true, LogLevel::Debug)
        }
        ImageUploadError::Decode(_) => ("DECODE_FAILED", true, LogLevel::Warn),
        ImageUploadError::Encode(_) => ("ENCODE_FAILED", false, LogLevel::Error),
        ImageUploadError::Transport => ("UPLOAD_FAILED", true, LogLevel::Error),
        ImageUploadError::UrlResolution { .. } => ("URL_RESOLUTION_FAILED", true, LogLevel::Error),
        ImageUploadError::InvalidUrl(_) => ("INVALID_URL", false, LogLevel::Debug),
    }
}

impl ErrorMetadata for ImageUploadError {
    fn error_code(&self) -> &'static str {
        static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        static_metadata(self).1
    }

    fn client_message(&self) -> String {
        match self {
            ImageUploadError::Validation(ValidationError::UnsupportedType { .. }) => {
                "Type de fichier non supporté. Utilisez JPG, PNG ou WebP.".to_string()
            }
            ImageUploadError::Validation(ValidationError::FileTooLarge { max, .. }) => format!(
                "Fichier trop volumineux. Maximum {}MB autorisé.",
                max / (1024 * 1024)
            ),
            ImageUploadError::Decode(_) => "Impossible de charger l'image".to_string(),
            ImageUploadError::Encode(_) => "Impossible de compresser l'image".to_string(),
            ImageUploadError::Transport => "Échec du téléchargement de l'image".to_string(),
            ImageUploadError::UrlResolution { .. } => {
                "Impossible d'obtenir l'URL de l'image".to_string()
            }
            ImageUploadError::InvalidUrl(_) => "URL d'image invalide".to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        static_metadata(self).2
    }
}
