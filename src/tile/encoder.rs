//! Tile image encoder.
//!
//! Rendered pixel grids are encoded once, when a tile is first generated, and
//! the encoded bytes are what the cache stores and serves.
//!
//! # Formats
//!
//! - **WebP** (default): lossless, so density levels and category colours
//!   survive encoding exactly.
//! - **JPEG**: lossy at a configurable quality, for smaller caches.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, RgbImage};

use crate::error::TileError;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// Container format of encoded tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum TileFormat {
    /// Lossless WebP
    #[default]
    #[value(name = "webp")]
    WebP,

    /// Lossy JPEG
    #[value(name = "jpeg")]
    Jpeg,
}

impl TileFormat {
    /// File extension used for cached tiles.
    pub fn extension(&self) -> &'static str {
        match self {
            TileFormat::WebP => "webp",
            TileFormat::Jpeg => "jpg",
        }
    }

    /// MIME type served for this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            TileFormat::WebP => "image/webp",
            TileFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Encoder turning RGB pixel grids into image bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileEncoder {
    format: TileFormat,
    quality: u8,
}

impl TileEncoder {
    /// Create a lossless WebP encoder.
    pub fn new() -> Self {
        Self {
            format: TileFormat::WebP,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Create an encoder for `format`; `quality` only affects JPEG.
    pub fn with_format(format: TileFormat, quality: u8) -> Self {
        Self {
            format,
            quality: clamp_quality(quality),
        }
    }

    /// Output format.
    pub fn format(&self) -> TileFormat {
        self.format
    }

    /// JPEG quality.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode an RGB image.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::EncodeError`] if the codec rejects the image.
    pub fn encode(&self, image: &RgbImage) -> Result<Bytes, TileError> {
        let mut output = Vec::new();
        let to_error = |e: image::ImageError| TileError::EncodeError {
            message: e.to_string(),
        };

        match self.format {
            TileFormat::WebP => WebPEncoder::new_lossless(&mut output)
                .encode(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    ExtendedColorType::Rgb8,
                )
                .map_err(to_error)?,
            TileFormat::Jpeg => JpegEncoder::new_with_quality(&mut output, self.quality)
                .encode_image(image)
                .map_err(to_error)?,
        }

        Ok(Bytes::from(output))
    }

    /// Decode bytes produced by this encoder back into RGB pixels.
    pub fn decode(&self, data: &[u8]) -> Result<RgbImage, image::ImageError> {
        let format = match self.format {
            TileFormat::WebP => image::ImageFormat::WebP,
            TileFormat::Jpeg => image::ImageFormat::Jpeg,
        };
        let reader = image::ImageReader::with_format(Cursor::new(data), format);
        Ok(reader.decode()?.to_rgb8())
    }
}

impl Default for TileEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate JPEG quality parameter.
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    (MIN_JPEG_QUALITY..=MAX_JPEG_QUALITY).contains(&quality)
}

/// Clamp quality to valid range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}
