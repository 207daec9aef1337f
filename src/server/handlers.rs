//! HTTP request handlers for the conversion API.
//!
//! # Endpoints
//!
//! - `POST /convert` - Convert a HEIC body to JPEG
//! - `GET /health` - Health check endpoint

use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

use crate::convert::{Codec, Converter};
use crate::error::{CodecError, ConversionError, ServiceError};

/// Content type of successful conversion responses.
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Suggested filename for successful conversion responses.
pub const CONTENT_DISPOSITION: &str = "attachment; filename=converted.jpg";

/// Default deadline for a single conversion.
pub const DEFAULT_CONVERSION_TIMEOUT: Duration = Duration::from_secs(30);

/// Default bound on conversions running at once: one per available core.
pub fn default_max_conversions() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the converter.
///
/// This is passed to all handlers via Axum's State extractor. The converter
/// is stateless, so sharing it across concurrent requests needs no locking.
pub struct AppState<C: Codec> {
    /// The conversion pipeline
    pub converter: Arc<Converter<C>>,

    /// Deadline for one conversion (defaults to 30 seconds)
    pub conversion_timeout: Duration,

    /// Permits for conversions on the blocking pool.
    ///
    /// A permit stays with its blocking task until the task returns, even
    /// after the request gave up on it at the deadline.
    pub conversion_permits: Arc<Semaphore>,
}

impl<C: Codec> AppState<C> {
    /// Create a new application state with the default conversion deadline.
    pub fn new(converter: Converter<C>) -> Self {
        Self::with_timeout(converter, DEFAULT_CONVERSION_TIMEOUT)
    }

    /// Create a new application state with a custom conversion deadline.
    pub fn with_timeout(converter: Converter<C>, conversion_timeout: Duration) -> Self {
        Self {
            converter: Arc::new(converter),
            conversion_timeout,
            conversion_permits: Arc::new(Semaphore::new(default_max_conversions())),
        }
    }

    /// Bound the number of conversions running at once (at least 1).
    pub fn with_max_conversions(mut self, max_conversions: usize) -> Self {
        self.conversion_permits = Arc::new(Semaphore::new(max_conversions.max(1)));
        self
    }
}

impl<C: Codec> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            converter: Arc::clone(&self.converter),
            conversion_timeout: self.conversion_timeout,
            conversion_permits: Arc::clone(&self.conversion_permits),
        }
    }
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert ServiceError to a plain-text HTTP response.
///
/// Decode failures are the client's fault (400) and are logged at WARN.
/// Everything else is a server fault (500) and is logged at ERROR.
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ServiceError::Conversion(ConversionError::Decode(cause)) => (
                StatusCode::BAD_REQUEST,
                "decode_error",
                format!("decoding HEIF image: {}", cause),
            ),

            ServiceError::Conversion(ConversionError::Encode(cause)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "encode_error",
                format!("encoding JPEG image: {}", cause),
            ),

            ServiceError::Timeout { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "timeout",
                format!("converting HEIF to JPEG: {}", self),
            ),

            ServiceError::Worker(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "conversion_error",
                format!("converting HEIF to JPEG: {}", self),
            ),
        };

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            message,
        )
            .into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle conversion requests.
///
/// # Endpoint
///
/// `POST /convert`
///
/// # Request
///
/// Raw HEIC bytes, conventionally sent with `Content-Type: image/heic`. The
/// content type is not enforced. A body that cannot be read to the end (peer
/// reset, read timeout) is reported like undecodable input.
///
/// # Response
///
/// - `200 OK`: JPEG bytes with `Content-Type: image/jpeg` and
///   `Content-Disposition: attachment; filename=converted.jpg`
/// - `400 Bad Request`: The body could not be read or decoded
/// - `500 Internal Server Error`: Encoding failed, the deadline passed, or
///   the conversion task died
///
/// Error bodies are plain text. The JPEG headers are only set on success.
///
/// Waiting for a conversion permit counts against the deadline, so a
/// saturated service answers 500 instead of queueing blocking work.
pub async fn convert_handler<C: Codec + 'static>(
    State(state): State<AppState<C>>,
    body: Body,
) -> Result<Response, ServiceError> {
    let input = body
        .collect()
        .await
        .map_err(|e| ConversionError::Decode(CodecError::Io(io::Error::other(e))))?
        .to_bytes();

    debug!(input_bytes = input.len(), "Received conversion request");

    let converter = Arc::clone(&state.converter);
    let permits = Arc::clone(&state.conversion_permits);
    let conversion = async move {
        let permit = permits
            .acquire_owned()
            .await
            .map_err(|e| ServiceError::Worker(e.to_string()))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            converter.convert_bytes(&input)
        })
        .await
        .map_err(|e| ServiceError::Worker(e.to_string()))
    };

    // On timeout the blocking task keeps running to completion, but its
    // result is dropped and the response goes out now.
    let jpeg = match tokio::time::timeout(state.conversion_timeout, conversion).await {
        Ok(result) => result??,
        Err(_) => {
            return Err(ServiceError::Timeout {
                timeout: state.conversion_timeout,
            })
        }
    };

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, JPEG_CONTENT_TYPE)
        .header(header::CONTENT_DISPOSITION, CONTENT_DISPOSITION)
        .body(Body::from(jpeg))
        .map_err(|e| ServiceError::Worker(e.to_string()))?;

    Ok(response)
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with body `OK`.
pub async fn health_handler() -> &'static str {
    "OK"
}

// =============================================================================
// Tests
// =============================================================================
