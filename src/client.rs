//! Client for the conversion service.
//!
//! A thin wrapper over `reqwest` that POSTs HEIC bytes to `/convert` and
//! hands back the JPEG response body.
//!
//! # Example
//!
//! ```no_run
//! use unheic::client::{Client, ClientConfig};
//! use unheic::error::ClientError;
//!
//! # async fn run() -> Result<(), ClientError> {
//! let client = Client::new(ClientConfig::default().with_base_url("http://converter:8080"));
//!
//! let heic = tokio::fs::File::open("photo.heic").await.unwrap();
//! match client.convert(heic).await {
//!     Ok(stream) => {
//!         let jpeg = stream.bytes().await?;
//!         std::fs::write("photo.jpg", &jpeg).unwrap();
//!     }
//!     Err(ClientError::BadRequest) => eprintln!("not a HEIC image"),
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::StatusCode;
use tracing::debug;

use crate::error::ClientError;

/// Default service base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Content type sent with conversion requests.
pub const HEIC_CONTENT_TYPE: &str = "image/heic";

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for [`Client`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the service (default: `http://localhost:8080`)
    pub base_url: String,

    /// HTTP client used for requests (default: `reqwest::Client::new()`)
    pub http_client: reqwest::Client,

    /// Per-request timeout (default: none)
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http_client: reqwest::Client::new(),
            timeout: None,
        }
    }
}

impl ClientConfig {
    /// Set the service base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a preconfigured HTTP client.
    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Bound each conversion request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

// =============================================================================
// Client
// =============================================================================

/// Client for the `/convert` endpoint.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Client {
    http_client: reqwest::Client,
    convert_url: String,
    timeout: Option<Duration>,
}

impl Client {
    /// Create a client from its configuration.
    pub fn new(config: ClientConfig) -> Self {
        let base_url = config.base_url.trim_end_matches('/');
        Self {
            http_client: config.http_client,
            convert_url: format!("{}/convert", base_url),
            timeout: config.timeout,
        }
    }

    /// The full URL of the conversion endpoint.
    pub fn convert_url(&self) -> &str {
        &self.convert_url
    }

    /// Convert a HEIC image to JPEG.
    ///
    /// `body` is sent as-is: an in-memory buffer, a `tokio::fs::File`, or any
    /// byte stream wrapped with [`reqwest::Body::wrap_stream`]. Streamed bodies
    /// are sent with chunked transfer encoding.
    ///
    /// Dropping the returned future cancels the request.
    ///
    /// # Errors
    ///
    /// - [`ClientError::BadRequest`] if the service rejected the input (400)
    /// - [`ClientError::UnexpectedStatus`] for any other non-200 status
    /// - [`ClientError::Transport`] if the request could not be completed
    pub async fn convert(&self, body: impl Into<reqwest::Body>) -> Result<JpegStream, ClientError> {
        let mut request = self
            .http_client
            .post(&self.convert_url)
            .header(CONTENT_TYPE, HEIC_CONTENT_TYPE)
            .body(body);

        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();

        debug!(url = %self.convert_url, status = status.as_u16(), "Conversion response");

        match status {
            StatusCode::OK => Ok(JpegStream { response }),
            StatusCode::BAD_REQUEST => Err(ClientError::BadRequest),
            other => Err(ClientError::UnexpectedStatus(other)),
        }
    }
}

// =============================================================================
// Response Stream
// =============================================================================

/// Body of a successful conversion.
///
/// Owns the HTTP response. Dropping it, drained or not, releases the
/// connection.
#[derive(Debug)]
pub struct JpegStream {
    response: reqwest::Response,
}

impl JpegStream {
    /// Content length announced by the service, if any.
    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }

    /// Read the next chunk of JPEG bytes, or `None` at the end of the body.
    pub async fn chunk(&mut self) -> Result<Option<Bytes>, ClientError> {
        Ok(self.response.chunk().await?)
    }

    /// Read the rest of the body.
    pub async fn bytes(self) -> Result<Bytes, ClientError> {
        Ok(self.response.bytes().await?)
    }
}
