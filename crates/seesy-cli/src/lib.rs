use std::path::Path;

use anyhow::Context;
use seesy_core::{Config, ErrorMetadata, LogLevel};
use seesy_processing::{content_type_for_file_name, ImageFile, ImageUploadError, ImageValidator};
use tracing_subscriber::EnvFilter;

/// Log filter from `RUST_LOG`, `info` when unset.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter())
        .init();
}

/// Load `.env` and then start tracing, so `RUST_LOG` may come from the file.
pub fn init_cli() {
    dotenvy::dotenv().ok();
    init_tracing();
}

/// Read an image from disk. Without an explicit content type it is guessed
/// from the extension.
pub async fn load_image_file(path: &Path, content_type: Option<&str>) -> anyhow::Result<ImageFile> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("Invalid file name: {}", path.display()))?
        .to_string();

    let content_type = match content_type {
        Some(ct) => ct.to_string(),
        None => content_type_for_file_name(&file_name)
            .with_context(|| {
                format!(
                    "Cannot infer content type of {}; pass --content-type",
                    file_name
                )
            })?
            .to_string(),
    };

    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    Ok(ImageFile::new(file_name, content_type, data))
}

/// Log a pipeline error at its own level and turn it into the message an
/// admin would see.
pub fn user_error(err: ImageUploadError) -> anyhow::Error {
    let code = err.error_code();
    let recoverable = err.is_recoverable();
    match err.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %err, code = code, recoverable = recoverable, "Image operation rejected")
        }
        LogLevel::Warn => {
            tracing::warn!(error = %err, code = code, recoverable = recoverable, "Image operation failed")
        }
        LogLevel::Error => {
            tracing::error!(error = %err, code = code, recoverable = recoverable, "Image operation failed")
        }
    }

    anyhow::anyhow!("{} [{}]", err.client_message(), err.error_code())
}

/// Validator for `seesy validate`, same policy as `seesy upload`.
pub fn validator_from_config(config: &Config) -> ImageValidator {
    ImageValidator::from_config(config)
}

/// One progress line, e.g. `Upload:  42.0%`.
pub fn progress_line(percent: f64) -> String {
    format!("Upload: {:>5.1}%", percent)
}
