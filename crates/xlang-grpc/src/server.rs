//! Server configuration and startup sequencing
//!
//! Startup runs `Starting -> Bound -> Serving`, and any failure lands in
//! `Failed` without reaching the next step:
//!
//! 1. bootstrap the primitive catalog (nothing else happens if it fails)
//! 2. bind the listener
//! 3. construct and register every capability service
//! 4. serve until terminated

use std::fmt;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};

use tracing::{error, info};
use xlang_crypto::{Bootstrap, Catalog, InitError};

use crate::error::{BindError, RegisterError, StartupError};
use crate::host::ServerHost;
use crate::proto::aead_server::AeadServer;
use crate::proto::keyset_server::KeysetServer;
use crate::proto::metadata_server::MetadataServer;
use crate::service::{AeadService, KeysetService, MetadataService};

/// Port the reference deployment listens on
pub const DEFAULT_PORT: u16 = 23456;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen address; `::` means all interfaces
    pub addr: String,

    /// Listen port; 0 picks an ephemeral port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "::".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        Self {
            addr: addr.into(),
            port,
        }
    }

    /// Loopback configuration on the given port
    pub fn loopback(port: u16) -> Self {
        Self::new("127.0.0.1", port)
    }

    /// Resolve the socket address to bind
    ///
    /// # Errors
    /// Returns `BindError::InvalidAddress` if `addr` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, BindError> {
        let ip: IpAddr = self
            .addr
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse()
            .map_err(|_| BindError::InvalidAddress(self.addr.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Startup phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Configuration resolved, bootstrap in progress
    Starting,
    /// Listener bound, services being registered
    Bound,
    /// Accept loop running
    Serving,
    /// Startup aborted
    Failed,
}

impl Phase {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Starting => "starting",
            Phase::Bound => "bound",
            Phase::Serving => "serving",
            Phase::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bootstrapped, bound host with every capability service registered
#[derive(Debug)]
pub struct Harness {
    host: ServerHost,
}

impl Harness {
    /// Bootstrap the default catalog, bind, and register all services
    ///
    /// # Errors
    /// Returns the first fatal startup error; later steps are not attempted.
    pub async fn start(config: &ServerConfig) -> Result<Self, StartupError> {
        Self::start_with(config, xlang_crypto::aead::register).await
    }

    /// Like [`Harness::start`], with a custom catalog registration step
    pub async fn start_with<F>(config: &ServerConfig, register: F) -> Result<Self, StartupError>
    where
        F: FnOnce(&mut Catalog) -> Result<(), InitError>,
    {
        Self::sequence(config, register).await.map_err(|e| {
            error!(phase = %Phase::Failed, reached = %e.phase(), error = %e, "startup failed");
            e
        })
    }

    async fn sequence<F>(config: &ServerConfig, register: F) -> Result<Self, StartupError>
    where
        F: FnOnce(&mut Catalog) -> Result<(), InitError>,
    {
        info!(phase = %Phase::Starting, port = config.port, "starting testing server");

        let mut bootstrap = Bootstrap::new();
        bootstrap.initialize_with(register)?;

        let addr = config.socket_addr()?;
        let mut host = ServerHost::bind(addr).await?;
        info!(phase = %Phase::Bound, address = %host.local_addr(), "listener bound");

        register_services(&mut host, &bootstrap)?;

        Ok(Self { host })
    }

    /// Address actually bound
    pub fn local_addr(&self) -> SocketAddr {
        self.host.local_addr()
    }

    /// The host, for inspection
    pub fn host(&self) -> &ServerHost {
        &self.host
    }

    /// Serve until the process is terminated
    pub async fn serve(self) -> Result<(), StartupError> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Serve until `signal` resolves
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<(), StartupError>
    where
        F: Future<Output = ()> + Send,
    {
        info!(phase = %Phase::Serving, "Server listening on {}", self.local_addr());
        self.host.serve_with_shutdown(signal).await.map_err(|e| {
            error!(phase = %Phase::Failed, error = %e, "serving stopped");
            StartupError::from(e)
        })
    }
}

/// Construct every capability service from a ready bootstrap and register it
///
/// # Errors
/// Returns error if the bootstrap is not ready or a service name collides.
pub fn register_services(host: &mut ServerHost, bootstrap: &Bootstrap) -> Result<(), RegisterError> {
    // Build everything first so nothing is registered if the bootstrap is not ready.
    let metadata = MetadataService::new(bootstrap)?;
    let keyset = KeysetService::new(bootstrap)?;
    let aead = AeadService::new(bootstrap)?;

    host.register(MetadataServer::new(metadata))?;
    host.register(KeysetServer::new(keyset))?;
    host.register(AeadServer::new(aead))?;
    Ok(())
}

/// Start the gRPC server and serve forever
///
/// # Errors
/// Returns error if bootstrap, bind or registration fails, or the listener
/// becomes unusable.
pub async fn run(config: ServerConfig) -> Result<(), StartupError> {
    Harness::start(&config).await?.serve().await
}
