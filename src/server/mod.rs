//! HTTP server layer.
//!
//! This module provides the HTTP API around the conversion pipeline.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │               POST /convert        GET /health                  │
//! │                                                                 │
//! │  ┌───────────────────────────┐  ┌────────────────────────────┐  │
//! │  │         handlers          │  │           routes           │  │
//! │  │ (requests, error mapping) │  │ (timeouts, body limits)    │  │
//! │  └───────────────────────────┘  └────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    convert_handler, default_max_conversions, health_handler, AppState, CONTENT_DISPOSITION,
    DEFAULT_CONVERSION_TIMEOUT, JPEG_CONTENT_TYPE,
};
pub use routes::{create_router, RouterConfig, DEFAULT_READ_TIMEOUT};
