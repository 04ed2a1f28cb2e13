use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use seesy_core::constants::{DEFAULT_MAX_WIDTH, DEFAULT_QUALITY};
use seesy_core::Config;
use std::io::Cursor;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Compression failures. Nothing is uploaded when either occurs.
#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Resize/quality target for a single compression pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressionOptions {
    /// Images wider than this are scaled down, keeping the aspect ratio
    pub max_width: u32,
    /// Encoder quality factor in `0.0..=1.0` (ignored for PNG)
    pub quality: f32,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl CompressionOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_width: config.image_max_width,
            quality: config.image_quality,
        }
    }
}

/// Output format for compressed images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    /// Map a declared MIME type to the encoder that re-creates it.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type.trim().to_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(OutputFormat::Jpeg),
            "image/png" => Some(OutputFormat::Png),
            "image/webp" => Some(OutputFormat::WebP),
            _ => None,
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
        }
    }
}

/// Re-encoded image ready for upload
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub data: Bytes,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Target dimensions for an image of `width` x `height`.
///
/// Only images wider than `max_width` shrink; the height is rounded half up
/// and never drops below one pixel.
pub fn scaled_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width || width == 0 {
        return (width, height);
    }

    let (w, h, max) = (width as u64, height as u64, max_width as u64);
    let scaled_height = ((h * max * 2 + w) / (2 * w)).max(1);
    (max_width, scaled_height as u32)
}

/// Decode, downscale and re-encode an image in its declared MIME type.
///
/// CPU-bound; async callers should go through [`compress_image_async`].
pub fn compress_image(
    data: &[u8],
    content_type: &str,
    options: &CompressionOptions,
) -> Result<CompressedImage, CompressionError> {
    let format = OutputFormat::from_content_type(content_type).ok_or_else(|| {
        CompressionError::Encode(format!("Unsupported output type: {}", content_type))
    })?;

    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| CompressionError::Decode(e.to_string()))?
        .decode()
        .map_err(|e| CompressionError::Decode(e.to_string()))?;

    let (orig_width, orig_height) = img.dimensions();
    let (width, height) = scaled_dimensions(orig_width, orig_height, options.max_width);
    let img = if (width, height) != (orig_width, orig_height) {
        img.resize_exact(width, height, FilterType::Triangle)
    } else {
        img
    };

    let quality = options.quality.clamp(0.0, 1.0);
    let encoded = match format {
        OutputFormat::Jpeg => encode_jpeg(&img, quality)?,
        OutputFormat::Png => encode_png(&img)?,
        OutputFormat::WebP => encode_webp(&img, quality)?,
    };

    if encoded.is_empty() {
        return Err(CompressionError::Encode(
            "Encoder produced no data".to_string(),
        ));
    }

    tracing::debug!(
        content_type = format.to_mime_type(),
        original_width = orig_width,
        original_height = orig_height,
        width = width,
        height = height,
        input_bytes = data.len(),
        output_bytes = encoded.len(),
        "Image compressed"
    );

    Ok(CompressedImage {
        data: Bytes::from(encoded),
        content_type: format.to_mime_type(),
        width,
        height,
    })
}

/// [`compress_image`] on the blocking thread pool.
pub async fn compress_image_async(
    data: Bytes,
    content_type: String,
    options: CompressionOptions,
) -> Result<CompressedImage, CompressionError> {
    tokio::task::spawn_blocking(move || compress_image(&data, &content_type, &options))
        .await
        .map_err(|e| CompressionError::Encode(format!("Compression task failed: {}", e)))?
}

/// Compress to JPEG using mozjpeg
fn encode_jpeg(img: &DynamicImage, quality: f32) -> Result<Vec<u8>, CompressionError> {
    let rgb_img = img.to_rgb8();
    let (width, height) = rgb_img.dimensions();

    // libjpeg errors surface as panics
    let result = catch_unwind(AssertUnwindSafe(|| -> std::io::Result<Vec<u8>> {
        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality * 100.0);
        comp.set_optimize_coding(true);

        let mut comp = comp.start_compress(Vec::new())?;
        comp.write_scanlines(rgb_img.as_raw())?;
        comp.finish()
    }));

    match result {
        Ok(Ok(jpeg_data)) => Ok(jpeg_data),
        Ok(Err(e)) => Err(CompressionError::Encode(e.to_string())),
        Err(_) => Err(CompressionError::Encode(
            "JPEG encoder aborted".to_string(),
        )),
    }
}

/// Compress to PNG (lossless)
fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, CompressionError> {
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| CompressionError::Encode(e.to_string()))?;
    Ok(buffer)
}

/// Compress to WebP
fn encode_webp(img: &DynamicImage, quality: f32) -> Result<Vec<u8>, CompressionError> {
    let rgba_img = img.to_rgba8();
    let (width, height) = rgba_img.dimensions();

    let encoder = webp::Encoder::from_rgba(rgba_img.as_raw(), width, height);
    let webp_data = encoder
        .encode_simple(false, quality * 100.0)
        .map_err(|e| CompressionError::Encode(format!("WebP encoder rejected image: {:?}", e)))?;

    Ok(webp_data.to_vec())
}
