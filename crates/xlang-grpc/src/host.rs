//! Server host
//!
//! Owns the single listener and the dispatch table. The lifecycle is
//! encoded in ownership: [`ServerHost::bind`] is the only constructor, so
//! services can only be registered on a bound host, and [`ServerHost::serve`]
//! consumes the host, so nothing can be registered once serving starts.

use std::collections::BTreeSet;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tonic::body::BoxBody;
use tonic::codegen::http::{Request, Response};
use tonic::codegen::Service;
use tonic::server::NamedService;
use tonic::service::{Routes, RoutesBuilder};
use tonic::transport::Server;
use tracing::{debug, info, warn};

use crate::error::{BindError, RegisterError, ServeError};
use crate::transport;

/// Registered services, keyed by their schema name
///
/// Names are checked for uniqueness on insertion, so a misconfigured host
/// fails at startup rather than on the first routed call.
#[derive(Debug, Default)]
pub struct ServiceSet {
    names: BTreeSet<&'static str>,
    routes: RoutesBuilder,
}

impl ServiceSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service under its `NamedService::NAME`
    ///
    /// # Errors
    /// Returns `RegisterError::Duplicate` if the name is taken.
    pub fn insert<S>(&mut self, service: S) -> Result<(), RegisterError>
    where
        S: Service<Request<BoxBody>, Response = Response<BoxBody>, Error = Infallible>
            + NamedService
            + Clone
            + Send
            + 'static,
        S::Future: Send + 'static,
    {
        if !self.names.insert(S::NAME) {
            return Err(RegisterError::Duplicate(S::NAME));
        }
        self.routes.add_service(service);
        debug!(service = S::NAME, "registered service");
        Ok(())
    }

    /// Registered schema names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        self.names.iter().copied().collect()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn into_routes(self) -> Routes {
        self.routes.routes()
    }
}

/// A bound listener plus the services it dispatches to
#[derive(Debug)]
pub struct ServerHost {
    listener: TcpListener,
    local_addr: SocketAddr,
    services: ServiceSet,
}

impl ServerHost {
    /// Bind the listener
    ///
    /// # Errors
    /// Returns error if the address is in use or cannot be bound.
    pub async fn bind(addr: SocketAddr) -> Result<Self, BindError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| BindError::Io { addr, source })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| BindError::Io { addr, source })?;

        debug!(%local_addr, "listener bound");
        Ok(Self {
            listener,
            local_addr,
            services: ServiceSet::new(),
        })
    }

    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Attach a capability service
    ///
    /// # Errors
    /// Returns `RegisterError::Duplicate` if a service with the same schema
    /// name is already registered.
    pub fn register<S>(&mut self, service: S) -> Result<(), RegisterError>
    where
        S: Service<Request<BoxBody>, Response = Response<BoxBody>, Error = Infallible>
            + NamedService
            + Clone
            + Send
            + 'static,
        S::Future: Send + 'static,
    {
        self.services.insert(service)
    }

    /// Registered services
    pub fn services(&self) -> &ServiceSet {
        &self.services
    }

    /// Serve until the process is terminated
    ///
    /// Only returns if the listener fails.
    pub async fn serve(self) -> Result<(), ServeError> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Serve until `signal` resolves or the listener fails
    pub async fn serve_with_shutdown<F>(self, signal: F) -> Result<(), ServeError>
    where
        F: Future<Output = ()> + Send,
    {
        let ServerHost {
            listener,
            local_addr,
            services,
        } = self;

        if services.is_empty() {
            warn!(address = %local_addr, "serving with no registered services");
        }
        info!(address = %local_addr, services = ?services.names(), "serving");
        let (incoming, accept_task) = transport::accept_local(listener);

        let served = Server::builder()
            .add_routes(services.into_routes())
            .serve_with_incoming_shutdown(incoming, signal)
            .await;

        // Aborting a finished task keeps its output; a running one is cancelled.
        accept_task.abort();
        let listener_error = accept_task.await.ok().flatten();

        served?;
        match listener_error {
            Some(e) => Err(ServeError::Listener(e)),
            None => {
                info!(address = %local_addr, "server stopped");
                Ok(())
            }
        }
    }
}
