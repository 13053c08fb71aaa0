//! xlang Testing Server
//!
//! Entry point plumbing for the cross-language testing server: argument
//! parsing, configuration, logging and signal handling around
//! [`xlang_grpc::Harness`].

#![warn(missing_docs)]

pub mod cli;
pub mod config;

pub use cli::Cli;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use xlang_grpc::{Harness, StartupError};

/// Server error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Startup or serving failed
    #[error(transparent)]
    Startup(#[from] StartupError),
}

/// Install the global tracing subscriber (stderr)
///
/// `RUST_LOG` wins over `default_level` when set.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve configuration, start the harness and serve until signalled
pub async fn run(cli: Cli) -> Result<(), ServerError> {
    let config = config::resolve(&cli)?;
    let harness = Harness::start(&config).await?;

    // Drivers wait for this line on stdout before connecting.
    println!("Server listening on {}", harness.local_addr());
    harness.serve_with_shutdown(shutdown_signal()).await?;
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl-C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
