//! Upload and deletion of storefront images.

pub mod deletion;
pub mod pipeline;
pub mod types;

pub use deletion::ImageDeleter;
pub use pipeline::ImageUploader;
pub use types::{ImageFile, UploadedImage};
