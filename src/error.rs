//! Error types for unheic.
//!
//! Codec failures are classified once, in the pipeline, as decode (client
//! fault) or encode (server fault). The HTTP layer and the client map these
//! to and from status codes.

use std::time::Duration;

use http::StatusCode;
use thiserror::Error;

/// Errors raised by a codec adapter while decoding or encoding an image.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The input stream contained no bytes
    #[error("empty input")]
    EmptyInput,

    /// Reading the input stream or writing the output sink failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from the `image` crate decoders or the JPEG encoder
    #[error("{0}")]
    Image(#[from] image::ImageError),

    /// Error from libheif
    #[cfg(feature = "heif")]
    #[error("{0}")]
    Heif(#[from] libheif_rs::HeifError),

    /// The decoded pixel layout cannot be handled by the adapter
    #[error("unsupported pixel layout: {0}")]
    UnsupportedLayout(String),
}

/// Classified failure of a single conversion.
///
/// Every codec failure leaves the pipeline as exactly one of these variants,
/// with the adapter's error kept as the source.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The input could not be decoded (client fault)
    #[error("decode failure: {0}")]
    Decode(#[source] CodecError),

    /// The decoded image could not be encoded as JPEG (server fault)
    #[error("encode failure: {0}")]
    Encode(#[source] CodecError),
}

impl ConversionError {
    /// The underlying codec error.
    pub fn cause(&self) -> &CodecError {
        match self {
            ConversionError::Decode(cause) | ConversionError::Encode(cause) => cause,
        }
    }

    /// Whether the failure was caused by malformed input.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, ConversionError::Decode(_))
    }
}

/// Errors surfaced by the conversion endpoint.
///
/// This is the boundary type: the HTTP layer turns every variant into a
/// status code and a plain-text message.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The pipeline reported a classified failure
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// The conversion did not finish before the deadline
    #[error("deadline of {}s exceeded", .timeout.as_secs_f64())]
    Timeout { timeout: Duration },

    /// The blocking conversion task panicked or was cancelled
    #[error("conversion task failed: {0}")]
    Worker(String),
}

/// Errors returned by [`crate::client::Client`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service rejected the input as malformed (HTTP 400)
    #[error("bad request")]
    BadRequest,

    /// The service answered with a status other than 200 or 400
    #[error("unexpected status code: {}", .0.as_u16())]
    UnexpectedStatus(StatusCode),

    /// Connection, timeout or body-read failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ClientError {
    /// The HTTP status observed, if the failure came from a response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::BadRequest => Some(StatusCode::BAD_REQUEST),
            ClientError::UnexpectedStatus(status) => Some(*status),
            ClientError::Transport(err) => err.status(),
        }
    }
}
