//! Seesy CLI: run the storefront image pipeline from a shell.
//!
//! Storage is configured from the environment (or a `.env` file):
//! STORAGE_BACKEND, FIREBASE_STORAGE_BUCKET, FIREBASE_AUTH_TOKEN, or
//! LOCAL_STORAGE_PATH and LOCAL_STORAGE_BASE_URL for local storage.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use seesy_cli::{init_cli, load_image_file, progress_line, user_error, validator_from_config};
use seesy_core::constants::{DEFAULT_MAX_WIDTH, DEFAULT_QUALITY};
use seesy_core::{Config, ErrorMetadata};
use seesy_processing::{
    compress_image_async, CompressionOptions, ImageUploadError, MediaContext,
};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "seesy", about = "Seesy storefront image tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, compress and upload an image
    Upload {
        /// Path to the image
        file: PathBuf,
        /// Upload path prefix, e.g. "categories" or "items"
        #[arg(long)]
        path: String,
        /// MIME type; guessed from the extension when omitted
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Delete an uploaded image by its download URL
    Delete {
        /// Download URL returned by `upload`
        url: String,
    },
    /// Check an image against the type and size policy
    Validate {
        /// Path to the image
        file: PathBuf,
        /// MIME type; guessed from the extension when omitted
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Compress an image locally without uploading it
    Compress {
        /// Path to the image
        file: PathBuf,
        /// Where to write the compressed image
        #[arg(long)]
        output: PathBuf,
        /// Maximum width in pixels
        #[arg(long, default_value_t = DEFAULT_MAX_WIDTH)]
        max_width: u32,
        /// Quality factor between 0 and 1
        #[arg(long, default_value_t = DEFAULT_QUALITY)]
        quality: f32,
        /// MIME type; guessed from the extension when omitted
        #[arg(long)]
        content_type: Option<String>,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

async fn media_context() -> anyhow::Result<MediaContext> {
    let config = Config::from_env().context("Invalid configuration")?;
    MediaContext::from_config(config)
        .await
        .context("Failed to initialize storage")
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_cli();

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            file,
            path,
            content_type,
        } => {
            let context = media_context().await?;
            let image = load_image_file(&file, content_type.as_deref()).await?;

            let on_progress = |percent: f64| {
                let mut stderr = std::io::stderr();
                let _ = write!(stderr, "\r{}", progress_line(percent));
                let _ = stderr.flush();
            };
            let result = context
                .uploader
                .upload(image, &path, Some(&on_progress))
                .await;
            eprintln!();

            print_json(&result.map_err(user_error)?)?;
        }
        Commands::Delete { url } => {
            let context = media_context().await?;
            context.deleter.delete(&url).await.map_err(user_error)?;
            print_json(&serde_json::json!({ "success": true, "url": url }))?;
        }
        Commands::Validate { file, content_type } => {
            let image = load_image_file(&file, content_type.as_deref()).await?;
            let config = Config::from_env().context("Invalid configuration")?;
            let validator = validator_from_config(&config);
            let result = validator
                .validate(&image.content_type, image.size())
                .map_err(ImageUploadError::from);

            print_json(&serde_json::json!({
                "file_name": image.file_name,
                "content_type": image.content_type,
                "size_bytes": image.size(),
                "valid": result.is_ok(),
                "error": result.as_ref().err().map(|e| e.client_message()),
            }))?;

            if result.is_err() {
                return Ok(ExitCode::from(2));
            }
        }
        Commands::Compress {
            file,
            output,
            max_width,
            quality,
            content_type,
        } => {
            let image = load_image_file(&file, content_type.as_deref()).await?;
            let original_size = image.size();
            let options = CompressionOptions { max_width, quality };

            let compressed = compress_image_async(image.data, image.content_type, options)
                .await
                .map_err(|e| user_error(e.into()))?;
            tokio::fs::write(&output, &compressed.data)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;

            print_json(&serde_json::json!({
                "output": output.display().to_string(),
                "content_type": compressed.content_type,
                "width": compressed.width,
                "height": compressed.height,
                "original_size_bytes": original_size,
                "size_bytes": compressed.data.len(),
            }))?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
