//! Configuration module
//!
//! Storage backend selection and the image policy (size limit, allowed types,
//! compression target) are read from the environment once at startup.

use std::env;

use crate::constants::{
    ALLOWED_IMAGE_CONTENT_TYPES, DEFAULT_MAX_WIDTH, DEFAULT_QUALITY, FIREBASE_STORAGE_BASE_URL,
    UPLOAD_CHUNK_SIZE_BYTES,
};
use crate::storage_types::StorageBackend;

const MAX_FILE_SIZE_MB: usize = 5;
const FIREBASE_CHUNK_GRANULARITY: usize = 256 * 1024;

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub firebase_storage_bucket: Option<String>,
    pub firebase_storage_base_url: String,
    pub firebase_auth_token: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub upload_chunk_size_bytes: usize,
    // Image policy
    pub max_file_size_bytes: usize,
    pub allowed_content_types: Vec<String>,
    pub image_max_width: u32,
    pub image_quality: f32,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::Firebase,
        };

        let max_file_size_mb = var("MAX_FILE_SIZE_MB")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MAX_FILE_SIZE_MB);

        let allowed_content_types = var("ALLOWED_CONTENT_TYPES")
            .map(|s| {
                s.split(',')
                    .map(|ct| ct.trim().to_lowercase())
                    .filter(|ct| !ct.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                ALLOWED_IMAGE_CONTENT_TYPES
                    .iter()
                    .map(|ct| ct.to_string())
                    .collect()
            });

        let upload_chunk_size_bytes = var("UPLOAD_CHUNK_SIZE_KB")
            .map(|s| {
                s.parse::<usize>()
                    .map(|kb| kb * 1024)
                    .map_err(|_| anyhow::anyhow!("UPLOAD_CHUNK_SIZE_KB must be a valid number"))
            })
            .transpose()?
            .unwrap_or(UPLOAD_CHUNK_SIZE_BYTES);

        let config = Config {
            environment: var("ENVIRONMENT")
                .or_else(|| var("APP_ENV"))
                .unwrap_or_else(|| "development".to_string()),
            storage_backend,
            firebase_storage_bucket: var("FIREBASE_STORAGE_BUCKET"),
            firebase_storage_base_url: var("FIREBASE_STORAGE_BASE_URL")
                .unwrap_or_else(|| FIREBASE_STORAGE_BASE_URL.to_string()),
            firebase_auth_token: var("FIREBASE_AUTH_TOKEN"),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL"),
            upload_chunk_size_bytes,
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            allowed_content_types,
            image_max_width: var("IMAGE_MAX_WIDTH")
                .map(|s| {
                    s.parse::<u32>()
                        .map_err(|_| anyhow::anyhow!("IMAGE_MAX_WIDTH must be a valid number"))
                })
                .transpose()?
                .unwrap_or(DEFAULT_MAX_WIDTH),
            image_quality: var("IMAGE_QUALITY")
                .map(|s| {
                    s.parse::<f32>()
                        .map_err(|_| anyhow::anyhow!("IMAGE_QUALITY must be a number"))
                })
                .transpose()?
                .unwrap_or(DEFAULT_QUALITY),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.image_max_width == 0 {
            return Err(anyhow::anyhow!("IMAGE_MAX_WIDTH must be greater than zero"));
        }

        if !(self.image_quality > 0.0 && self.image_quality <= 1.0) {
            return Err(anyhow::anyhow!(
                "IMAGE_QUALITY must be in the range (0.0, 1.0]"
            ));
        }

        if self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_CONTENT_TYPES must not be empty"));
        }

        if self.upload_chunk_size_bytes == 0 {
            return Err(anyhow::anyhow!("UPLOAD_CHUNK_SIZE_KB must be greater than zero"));
        }

        match self.storage_backend {
            StorageBackend::Firebase => {
                if self.firebase_storage_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "FIREBASE_STORAGE_BUCKET must be set when using Firebase storage backend"
                    ));
                }
                if self.upload_chunk_size_bytes % FIREBASE_CHUNK_GRANULARITY != 0 {
                    return Err(anyhow::anyhow!(
                        "UPLOAD_CHUNK_SIZE_KB must be a multiple of 256 for Firebase storage"
                    ));
                }
                if self.is_production() && !self.firebase_storage_base_url.starts_with("https://")
                {
                    return Err(anyhow::anyhow!(
                        "FIREBASE_STORAGE_BASE_URL must use https in production"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}
