//! Seesy Core Library
//!
//! This crate provides configuration, error metadata and the storage backend
//! selector shared by the storage, processing and CLI crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
