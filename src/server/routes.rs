//! Router configuration for the conversion service.
//!
//! # Route Structure
//!
//! ```text
//! /health     - Health check
//! /convert    - HEIC to JPEG conversion (POST)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use unheic::convert::{Converter, ImageCodec};
//! use unheic::server::{create_router, RouterConfig};
//!
//! let config = RouterConfig::new()
//!     .with_conversion_timeout(Duration::from_secs(10))
//!     .with_read_timeout(Duration::from_secs(5));
//!
//! let router = create_router(Converter::new(ImageCodec::new()), config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::timeout::RequestBodyTimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{
    convert_handler, default_max_conversions, health_handler, AppState,
    DEFAULT_CONVERSION_TIMEOUT,
};
use crate::convert::{Codec, Converter};

/// Default time allowed for reading the request body.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Deadline for producing a conversion response
    pub conversion_timeout: Duration,

    /// Time allowed between request body frames
    pub read_timeout: Duration,

    /// Conversions allowed to run at once
    pub max_conversions: usize,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a router configuration with default settings.
    ///
    /// By default:
    /// - Conversion deadline is 30 seconds
    /// - Body read timeout is 30 seconds
    /// - One conversion per available core
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            conversion_timeout: DEFAULT_CONVERSION_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            max_conversions: default_max_conversions(),
            enable_tracing: true,
        }
    }

    /// Set the conversion deadline.
    pub fn with_conversion_timeout(mut self, timeout: Duration) -> Self {
        self.conversion_timeout = timeout;
        self
    }

    /// Set the request body read timeout.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set how many conversions may run at once.
    pub fn with_max_conversions(mut self, max_conversions: usize) -> Self {
        self.max_conversions = max_conversions;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router.
///
/// The conversion route accepts bodies of any size; axum's default body
/// limit is disabled for it.
///
/// # Arguments
///
/// * `converter` - The conversion pipeline
/// * `config` - Router configuration
pub fn create_router<C>(converter: Converter<C>, config: RouterConfig) -> Router
where
    C: Codec + 'static,
{
    let app_state = AppState::with_timeout(converter, config.conversion_timeout)
        .with_max_conversions(config.max_conversions);

    let convert_routes = Router::new()
        .route("/convert", post(convert_handler::<C>))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyTimeoutLayer::new(config.read_timeout))
        .with_state(app_state);

    let router = Router::new()
        .route("/health", get(health_handler))
        .merge(convert_routes);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

// =============================================================================
// Tests
// =============================================================================
