//! Seesy Storage Library
//!
//! This crate provides the object storage abstraction used by the image
//! pipeline, with a Firebase Storage backend and a local filesystem backend.
//!
//! # Object key format
//!
//! Keys are `{upload_path}/{timestamp_ms}_{sanitized_file_name}`, for example
//! `categories/1718035200123_tarte_aux_pommes.jpg`. Key generation lives in the
//! `keys` module so every backend and caller agrees on it.
//!
//! # Download URL format
//!
//! Both backends issue URLs whose path ends in `/o/{percent-encoded key}`
//! followed by a query string, which is what `urls::object_key_from_url`
//! parses when an asset is deleted.

#[cfg(feature = "storage-firebase")]
pub mod firebase;
pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod traits;
pub mod urls;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-firebase")]
pub use firebase::FirebaseStorage;
pub use keys::{generate_object_key, sanitize_file_name};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use seesy_core::StorageBackend;
pub use traits::{Storage, StorageError, StorageResult, UploadProgress};
pub use urls::{file_name_from_url, object_key_from_url};
