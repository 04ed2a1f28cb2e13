use std::sync::Arc;

use seesy_core::Config;
use seesy_storage::{create_storage, Storage, StorageResult};

use crate::upload::{ImageDeleter, ImageUploader};

/// Storage client and pipeline services, built once by the entry point.
#[derive(Clone)]
pub struct MediaContext {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub uploader: ImageUploader,
    pub deleter: ImageDeleter,
}

impl MediaContext {
    pub async fn from_config(config: Config) -> StorageResult<Self> {
        let storage = create_storage(&config).await?;

        tracing::info!(
            backend = %storage.backend_type(),
            max_file_size_bytes = config.max_file_size_bytes,
            image_max_width = config.image_max_width,
            image_quality = config.image_quality,
            "Media context initialized"
        );

        Ok(Self::with_storage(config, storage))
    }

    pub fn with_storage(config: Config, storage: Arc<dyn Storage>) -> Self {
        Self {
            uploader: ImageUploader::from_config(storage.clone(), &config),
            deleter: ImageDeleter::new(storage.clone()),
            storage,
            config,
        }
    }
}
