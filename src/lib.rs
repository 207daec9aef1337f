//! # unheic
//!
//! An HTTP service that converts HEIC/HEIF images to JPEG, and a small client
//! for it.
//!
//! The service accepts an encoded image as the body of `POST /convert`,
//! decodes it, re-encodes it as JPEG at a fixed quality of 90, and returns the
//! JPEG bytes. Malformed input is reported as `400 Bad Request`; failures on
//! the service side as `500 Internal Server Error`.
//!
//! ## Architecture
//!
//! - [`convert`] - Conversion pipeline and codec adapters
//! - [`server`] - Axum-based HTTP server and routes
//! - [`client`] - `reqwest`-based client for the service
//! - [`config`] - CLI and environment configuration
//! - [`error`] - Error taxonomy shared by all layers
//!
//! ## Features
//!
//! - `heif` (default): decode HEIC/HEIF natively through libheif, which
//!   `unheicd` uses as its codec. With `--no-default-features` only the
//!   `image` crate decoders remain, and HEIC input is rejected.
//!
//! ## Example
//!
//! ```rust,no_run
//! use unheic::{create_router, Converter, ImageCodec, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let router = create_router(Converter::new(ImageCodec::new()), RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod server;

// Re-export commonly used types
pub use client::{Client, ClientConfig, JpegStream, DEFAULT_BASE_URL, HEIC_CONTENT_TYPE};
pub use config::{Cli, Command, ConvertConfig, ServeConfig};
#[cfg(feature = "heif")]
pub use convert::HeifCodec;
pub use convert::{Codec, Converter, ImageCodec, JPEG_QUALITY};
pub use error::{ClientError, CodecError, ConversionError, ServiceError};
pub use server::{
    convert_handler, create_router, default_max_conversions, health_handler, AppState,
    RouterConfig, CONTENT_DISPOSITION, JPEG_CONTENT_TYPE,
};
