//! HEIC/HEIF adapter backed by libheif.
//!
//! Only the primary image of the container is converted. Decoding always
//! requests interleaved 8-bit RGB so the JPEG encoder never sees alpha.

use std::io::Write;

use image::{DynamicImage, RgbImage};
use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};

use super::codec::{write_jpeg, Codec};
use crate::error::CodecError;

/// Codec that decodes HEIC/HEIF with libheif and encodes JPEG with `image`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeifCodec;

impl HeifCodec {
    /// Create a new HEIF codec.
    pub fn new() -> Self {
        Self
    }
}

/// Copy a strided interleaved RGB plane into a packed `RgbImage`.
fn copy_rows(data: &[u8], stride: usize, width: u32, height: u32) -> Result<RgbImage, CodecError> {
    let row_len = width as usize * 3;

    if stride < row_len || row_len == 0 {
        return Err(CodecError::UnsupportedLayout(format!(
            "stride {} for {}x{} RGB plane",
            stride, width, height
        )));
    }

    // Rows may be padded, so copy them out one stride at a time.
    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for row in data.chunks(stride).take(height as usize) {
        let row = row.get(..row_len).ok_or_else(|| {
            CodecError::UnsupportedLayout(format!(
                "row shorter than {} bytes (stride {})",
                row_len, stride
            ))
        })?;
        pixels.extend_from_slice(row);
    }

    RgbImage::from_raw(width, height, pixels).ok_or_else(|| {
        CodecError::UnsupportedLayout(format!("truncated {}x{} RGB plane", width, height))
    })
}

impl Codec for HeifCodec {
    fn decode(&self, input: &[u8]) -> Result<DynamicImage, CodecError> {
        if input.is_empty() {
            return Err(CodecError::EmptyInput);
        }

        // A fresh context and decoder per call; nothing is shared between requests.
        let lib_heif = LibHeif::new();
        let context = HeifContext::read_from_bytes(input)?;
        let handle = context.primary_image_handle()?;
        let decoded = lib_heif.decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)?;

        let planes = decoded.planes();
        let plane = planes.interleaved.ok_or_else(|| {
            CodecError::UnsupportedLayout("no interleaved RGB plane".to_string())
        })?;

        let width = plane.width;
        let height = plane.height;
        let rgb = copy_rows(plane.data, plane.stride, width, height)?;
        Ok(DynamicImage::ImageRgb8(rgb))
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
        "libheif"
    }
}
