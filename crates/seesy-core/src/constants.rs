//! Default image policy and storage constants.

/// Largest accepted source image (5 MiB).
pub const MAX_IMAGE_SIZE_BYTES: usize = 5 * 1024 * 1024;

/// MIME types accepted by the validator.
pub const ALLOWED_IMAGE_CONTENT_TYPES: [&str; 4] =
    ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Compressed images are never wider than this.
pub const DEFAULT_MAX_WIDTH: u32 = 800;

/// Encoder quality factor in `0.0..=1.0`.
pub const DEFAULT_QUALITY: f32 = 0.8;

/// Resumable upload chunk size. Firebase requires multiples of 256 KiB for
/// every chunk except the last one.
pub const UPLOAD_CHUNK_SIZE_BYTES: usize = 256 * 1024;

pub const FIREBASE_STORAGE_BASE_URL: &str = "https://firebasestorage.googleapis.com";
