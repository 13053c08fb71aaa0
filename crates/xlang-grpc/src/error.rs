//! Error types for hosting the capability services
//!
//! Everything here is a fatal startup or listener error. Per-call failures
//! never appear as these types; they travel back in the RPC response.

use std::net::SocketAddr;

use thiserror::Error;
use xlang_crypto::InitError;

use crate::server::Phase;

/// Listener could not be created
#[derive(Debug, Error)]
pub enum BindError {
    /// Configured host is not an IP address
    #[error("invalid listen address '{0}'")]
    InvalidAddress(String),

    /// OS refused the bind (port in use, permission denied, ...)
    #[error("failed to bind {addr}: {source}")]
    Io {
        /// Address that was requested
        addr: SocketAddr,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },
}

/// Service could not be attached to the host
#[derive(Debug, Error)]
pub enum RegisterError {
    /// A service with the same schema name is already registered
    #[error("service '{0}' is already registered")]
    Duplicate(&'static str),

    /// Service construction requires a ready bootstrap
    #[error("cannot construct service: {0}")]
    Bootstrap(#[from] InitError),
}

/// Serve loop terminated abnormally
#[derive(Debug, Error)]
pub enum ServeError {
    /// The listener itself became unusable
    #[error("listener failed: {0}")]
    Listener(#[source] std::io::Error),

    /// tonic transport failure
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

/// Any failure between process start and the end of serving
#[derive(Debug, Error)]
pub enum StartupError {
    /// Library bootstrap failed
    #[error("library bootstrap failed: {0}")]
    Bootstrap(#[from] InitError),

    /// Listener bind failed
    #[error("{0}")]
    Bind(#[from] BindError),

    /// Service registration failed
    #[error("service registration failed: {0}")]
    Register(#[from] RegisterError),

    /// Serving ended with an error
    #[error("server error: {0}")]
    Serve(#[from] ServeError),
}

impl StartupError {
    /// Last phase reached before the failure
    pub fn phase(&self) -> Phase {
        match self {
            StartupError::Bootstrap(_) | StartupError::Bind(_) => Phase::Starting,
            StartupError::Register(_) => Phase::Bound,
            StartupError::Serve(_) => Phase::Serving,
        }
    }
}
