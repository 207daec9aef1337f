//! Conversion pipeline.
//!
//! The [`Converter`] is the core of the service. For each call it:
//! - Reads the whole input stream
//! - Decodes it with the codec adapter
//! - Encodes the pixel buffer as JPEG at [`JPEG_QUALITY`]
//! - Writes the JPEG bytes to the output sink
//!
//! Every codec failure is classified into a [`ConversionError`] variant
//! before it leaves this module. There are no retries and no timeouts here;
//! callers own both.

use std::io::{Read, Write};

use bytes::Bytes;
use tracing::debug;

use super::codec::{Codec, JPEG_QUALITY};
use crate::error::{CodecError, ConversionError};

/// Stateless HEIC to JPEG converter.
///
/// # Type Parameters
///
/// * `C` - The codec adapter (e.g., [`ImageCodec`](super::ImageCodec))
///
/// # Example
///
/// ```ignore
/// use unheic::convert::{Converter, HeifCodec};
///
/// let converter = Converter::new(HeifCodec::new());
///
/// let input = std::fs::File::open("photo.heic")?;
/// let output = std::fs::File::create("photo.jpg")?;
/// converter.convert(input, output)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Converter<C: Codec> {
    codec: C,
}

impl<C: Codec> Converter<C> {
    /// Create a converter around a codec adapter.
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    /// The codec adapter in use.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// JPEG quality used for every conversion.
    pub fn quality(&self) -> u8 {
        JPEG_QUALITY
    }

    /// Convert an encoded image read from `input` into JPEG written to `output`.
    ///
    /// # Errors
    ///
    /// - [`ConversionError::Decode`] if the input cannot be read or decoded
    /// - [`ConversionError::Encode`] if encoding or writing the output fails
    pub fn convert<R: Read, W: Write>(
        &self,
        mut input: R,
        mut output: W,
    ) -> Result<(), ConversionError> {
        let mut encoded = Vec::new();
        input
            .read_to_end(&mut encoded)
            .map_err(|e| ConversionError::Decode(CodecError::Io(e)))?;

        let image = self
            .codec
            .decode(&encoded)
            .map_err(ConversionError::Decode)?;

        // The encoded input is no longer needed once pixels exist.
        drop(encoded);

        debug!(
            codec = self.codec.name(),
            width = image.width(),
            height = image.height(),
            "Decoded input image"
        );

        self.codec
            .encode(&image, JPEG_QUALITY, &mut output)
            .map_err(ConversionError::Encode)?;

        output
            .flush()
            .map_err(|e| ConversionError::Encode(CodecError::Io(e)))?;

        Ok(())
    }

    /// Convert an in-memory encoded image, returning the JPEG bytes.
    pub fn convert_bytes(&self, input: &[u8]) -> Result<Bytes, ConversionError> {
        let mut output = Vec::new();
        self.convert(input, &mut output)?;

        debug!(
            input_bytes = input.len(),
            output_bytes = output.len(),
            "Converted image"
        );

        Ok(Bytes::from(output))
    }
}

// =============================================================================
// Tests
// =============================================================================
