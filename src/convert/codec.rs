//! Codec adapter seam and the `image`-crate backed adapter.

use std::io::Write;

use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;

use crate::error::CodecError;

/// JPEG quality used for every conversion (0-100 scale).
pub const JPEG_QUALITY: u8 = 90;

// =============================================================================
// Codec Trait
// =============================================================================

/// Decode/encode capability consumed by the [`Converter`](super::Converter).
///
/// Implementations must be safe to call from many requests at once. Each call
/// works on its own decoder or encoder instance; nothing mutable is shared
/// between invocations.
pub trait Codec: Send + Sync {
    /// Decode an encoded image into a pixel buffer.
    fn decode(&self, input: &[u8]) -> Result<DynamicImage, CodecError>;

    /// Encode a pixel buffer as JPEG into `sink`.
    fn encode(
        &self,
        image: &DynamicImage,
        quality: u8,
        sink: &mut dyn Write,
    ) -> Result<(), CodecError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

// =============================================================================
// Image Codec
// =============================================================================

/// Codec backed by the `image` crate.
///
/// Decodes any raster format compiled into `image` (JPEG and PNG in this
/// build), detected from the leading bytes. HEIC containers are not among
/// them; build with the `heif` feature for native HEIC decoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl ImageCodec {
    /// Create a new image codec.
    pub fn new() -> Self {
        Self
    }
}

impl Codec for ImageCodec {
    fn decode(&self, input: &[u8]) -> Result<DynamicImage, CodecError> {
        if input.is_empty() {
            return Err(CodecError::EmptyInput);
        }

        Ok(image::load_from_memory(input)?)
    }

    fn encode(
        &self,
        image: &DynamicImage,
        quality: u8,
        sink: &mut dyn Write,
    ) -> Result<(), CodecError> {
        write_jpeg(image, quality, sink)
    }

    fn name(&self) -> &'static str {
        "image"
    }
}

/// Encode a pixel buffer as baseline JPEG.
///
/// Luma and RGB buffers are written as-is; any other layout (alpha, 16-bit,
/// float) is flattened to 8-bit RGB first since JPEG carries neither.
pub(crate) fn write_jpeg(
    image: &DynamicImage,
    quality: u8,
    sink: &mut dyn Write,
) -> Result<(), CodecError> {
    let mut encoder = JpegEncoder::new_with_quality(sink, quality);

    match image {
        DynamicImage::ImageLuma8(gray) => encoder.encode_image(gray)?,
        DynamicImage::ImageRgb8(rgb) => encoder.encode_image(rgb)?,
        other => encoder.encode_image(&other.to_rgb8())?,
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
