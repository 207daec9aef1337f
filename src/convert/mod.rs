//! HEIC to JPEG conversion.
//!
//! This module provides the conversion pipeline and the codec adapters it
//! drives.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │               Converter                 │
//! │   read input → decode → encode(q=90)    │
//! │   codec failures → ConversionError      │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              Codec trait                │
//! └────────────────────┬────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │   HeifCodec     │    │     ImageCodec      │
//! │ (libheif, dflt) │    │  (image crate)      │
//! └─────────────────┘    └─────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`Converter`]: runs one decode and one encode per call, classifies failures
//! - [`Codec`]: the decode/encode seam
//! - [`ImageCodec`]: adapter backed by the `image` crate (JPEG and PNG input)
//! - `HeifCodec`: adapter backed by libheif, behind the default `heif` feature
//!
//! # Example
//!
//! ```
//! use unheic::convert::{Converter, ImageCodec};
//!
//! let converter = Converter::new(ImageCodec::new());
//!
//! // Empty input never decodes
//! let err = converter.convert_bytes(&[]).unwrap_err();
//! assert!(err.is_client_fault());
//! ```

mod codec;
#[cfg(feature = "heif")]
mod heif;
mod pipeline;

pub use codec::{Codec, ImageCodec, JPEG_QUALITY};
#[cfg(feature = "heif")]
pub use heif::HeifCodec;
pub use pipeline::Converter;
