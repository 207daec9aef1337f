//! Configuration management for unheic.
//!
//! Configuration is parsed once at startup into immutable values:
//! - Command-line arguments via clap
//! - Environment variables (`PORT`, `READ_TIMEOUT`, ...)
//! - Defaults for every setting
//!
//! # Environment Variables
//!
//! - `HOST` - Server bind address (default: 0.0.0.0)
//! - `PORT` - Server port (default: 8080)
//! - `READ_TIMEOUT` - Request body read timeout in seconds (default: 30)
//! - `WRITE_TIMEOUT` - Conversion deadline in seconds (default: 30)
//! - `IDLE_TIMEOUT` - Shutdown drain window in seconds (default: 60)
//! - `MAX_CONVERSIONS` - Conversions running at once (default: one per core)
//! - `UNHEIC_URL` - Service URL used by the `convert` subcommand
//!
//! Values that are not integers are rejected when arguments are parsed, which
//! aborts startup.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::client::DEFAULT_BASE_URL;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default request body read timeout in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 30;

/// Default conversion deadline in seconds.
pub const DEFAULT_WRITE_TIMEOUT_SECS: u64 = 30;

/// Default shutdown drain window in seconds.
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;

/// Default client request timeout in seconds for the `convert` subcommand.
pub const DEFAULT_CLIENT_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// CLI Arguments
// =============================================================================

/// unheicd - HEIC to JPEG conversion service.
///
/// Runs the HTTP service by default. The `convert` subcommand sends a local
/// file to a running service.
#[derive(Parser, Debug, Clone)]
#[command(name = "unheicd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub serve: ServeConfig,
}

impl Cli {
    /// Resolve the command to run, falling back to `serve`.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Serve(self.serve))
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the conversion service (default)
    Serve(ServeConfig),

    /// Convert a file through a running service
    Convert(ConvertConfig),
}

/// Settings for the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    // =========================================================================
    // Timeouts
    // =========================================================================
    /// Seconds allowed between request body frames.
    #[arg(long, default_value_t = DEFAULT_READ_TIMEOUT_SECS, env = "READ_TIMEOUT")]
    pub read_timeout: u64,

    /// Seconds allowed for producing a conversion response.
    #[arg(long, default_value_t = DEFAULT_WRITE_TIMEOUT_SECS, env = "WRITE_TIMEOUT")]
    pub write_timeout: u64,

    /// Seconds in-flight requests may take to finish after a shutdown signal.
    #[arg(long, default_value_t = DEFAULT_IDLE_TIMEOUT_SECS, env = "IDLE_TIMEOUT")]
    pub idle_timeout: u64,

    /// Conversions allowed to run at once (default: one per core).
    #[arg(long, env = "MAX_CONVERSIONS")]
    pub max_conversions: Option<usize>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("host must not be empty. Set --host or HOST".to_string());
        }

        if self.read_timeout == 0 {
            return Err("read_timeout must be greater than 0".to_string());
        }
        if self.write_timeout == 0 {
            return Err("write_timeout must be greater than 0".to_string());
        }
        if self.idle_timeout == 0 {
            return Err("idle_timeout must be greater than 0".to_string());
        }
        if self.max_conversions == Some(0) {
            return Err("max_conversions must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_secs(self.write_timeout)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout)
    }
}

/// Settings for the `convert` command.
#[derive(Args, Debug, Clone)]
pub struct ConvertConfig {
    /// HEIC file to convert.
    pub input: PathBuf,

    /// Where to write the JPEG (default: input path with a .jpg extension).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Base URL of the conversion service.
    #[arg(long, default_value = DEFAULT_BASE_URL, env = "UNHEIC_URL")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_CLIENT_TIMEOUT_SECS)]
    pub timeout: u64,
}

impl ConvertConfig {
    /// The output path, derived from the input when not given.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("jpg"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

// =============================================================================
// Tests
// =============================================================================
