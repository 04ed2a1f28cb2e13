//! Seesy Processing Library
//!
//! The storefront image pipeline: validation, compression, resumable upload
//! with progress, and deletion by download URL.
//!
//! ```text
//! ImageValidator -> compress_image -> Storage::upload_resumable -> download URL
//! download URL -> object_key_from_url -> Storage::delete
//! ```

pub mod compression;
pub mod context;
pub mod error;
pub mod upload;
pub mod validator;

// Re-export commonly used types
pub use compression::{
    compress_image, compress_image_async, scaled_dimensions, CompressedImage, CompressionError,
    CompressionOptions,
};
pub use context::MediaContext;
pub use error::ImageUploadError;
pub use upload::{ImageDeleter, ImageFile, ImageUploader, UploadedImage};
pub use validator::{content_type_for_file_name, ImageValidator, ValidationError};
