//! unheicd - HEIC to JPEG conversion service.
//!
//! This binary starts the HTTP server, or converts a single file through a
//! running server with the `convert` subcommand.

use clap::Parser;
use std::future::IntoFuture;
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use unheic::{
    client::{Client, ClientConfig},
    config::{Cli, Command, ConvertConfig, ServeConfig},
    convert::{Codec, Converter},
    error::ClientError,
    server::{create_router, RouterConfig},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.into_command() {
        Command::Serve(config) => run_serve(config).await,
        Command::Convert(config) => run_convert(config).await,
    }
}

// =============================================================================
// Serve Command
// =============================================================================

async fn run_serve(config: ServeConfig) -> ExitCode {
    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    #[cfg(feature = "heif")]
    let codec = unheic::convert::HeifCodec::new();
    #[cfg(not(feature = "heif"))]
    let codec = unheic::convert::ImageCodec::new();

    let converter = Converter::new(codec);

    info!("Configuration:");
    info!("  Codec: {}", converter.codec().name());
    info!("  JPEG quality: {}", converter.quality());
    info!(
        "  Timeouts: read {}s, write {}s, idle {}s",
        config.read_timeout, config.write_timeout, config.idle_timeout
    );
    if cfg!(not(feature = "heif")) {
        warn!("  Built with --no-default-features: HEIC input will be rejected");
    }

    let mut router_config = RouterConfig::new()
        .with_conversion_timeout(config.write_timeout())
        .with_read_timeout(config.read_timeout())
        .with_tracing(!config.no_tracing);
    if let Some(max_conversions) = config.max_conversions {
        router_config = router_config.with_max_conversions(max_conversions);
    }
    info!("  Concurrent conversions: {}", router_config.max_conversions);

    let router = create_router(converter, router_config);

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);
    info!("  curl http://{}/health", addr);
    info!(
        "  curl --data-binary @photo.heic -H 'Content-Type: image/heic' -o photo.jpg http://{}/convert",
        addr
    );

    let drain = config.idle_timeout();
    let shutdown = watch_shutdown_signal();
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_requested(shutdown.clone()))
        .into_future();

    // Graceful shutdown waits for in-flight requests; bound that wait.
    let result = tokio::select! {
        result = server => result,
        _ = drain_deadline(shutdown, drain) => {
            warn!("In-flight requests did not finish within {}s, exiting", drain.as_secs());
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Server stopped");
    ExitCode::SUCCESS
}

/// Resolves when SIGINT or SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining in-flight requests");
}

/// Listen for the shutdown signal once and publish it to every receiver.
fn watch_shutdown_signal() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = tx.send(true);
    });
    rx
}

/// Resolves once shutdown has been requested.
async fn shutdown_requested(mut shutdown: watch::Receiver<bool>) {
    // An error means the sender is gone, which only happens after it fired
    let _ = shutdown.wait_for(|requested| *requested).await;
}

/// Resolves `drain` after shutdown has been requested.
async fn drain_deadline(shutdown: watch::Receiver<bool>, drain: Duration) {
    shutdown_requested(shutdown).await;
    tokio::time::sleep(drain).await;
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "unheic=debug,unheicd=debug,tower_http=debug"
    } else {
        "unheic=info,unheicd=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

// =============================================================================
// Convert Command
// =============================================================================

async fn run_convert(config: ConvertConfig) -> ExitCode {
    // Streamed to the service rather than read into memory first
    let input = match tokio::fs::File::open(&config.input).await {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Error: cannot open {}: {}", config.input.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let client = Client::new(
        ClientConfig::default()
            .with_base_url(config.base_url.clone())
            .with_timeout(config.timeout()),
    );

    let jpeg = match client.convert(input).await {
        Ok(stream) => stream.bytes().await,
        Err(e) => Err(e),
    };

    let jpeg = match jpeg {
        Ok(jpeg) => jpeg,
        Err(ClientError::BadRequest) => {
            eprintln!(
                "Error: the service could not decode {}",
                config.input.display()
            );
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let output = config.output_path();
    if let Err(e) = tokio::fs::write(&output, &jpeg).await {
        eprintln!("Error: cannot write {}: {}", output.display(), e);
        return ExitCode::FAILURE;
    }

    println!("{} -> {} ({} bytes)", config.input.display(), output.display(), jpeg.len());
    ExitCode::SUCCESS
}
