#![warn(missing_docs)]

//! xlang gRPC Service Layer
//!
//! Exposes the primitive library to cross-language test drivers via gRPC.
//! Implements:
//! - Capability services (Metadata, Keyset, Aead) over the `tink_testing_api` schema
//! - The server host: one listener, a name-keyed dispatch table, the serve loop
//! - Local-trust transport that refuses non-loopback peers
//! - Startup sequencing: bootstrap, bind, register, serve

// Include generated protobuf code
pub mod proto {
    //! Generated protobuf types and service definitions
    #![allow(missing_docs)]
    tonic::include_proto!("tink_testing_api");
}

pub mod error;
pub mod host;
pub mod server;
pub mod service;
pub mod transport;

pub use error::{BindError, RegisterError, ServeError, StartupError};
pub use host::ServerHost;
pub use server::{run, Harness, Phase, ServerConfig, DEFAULT_PORT};
pub use service::{AeadService, KeysetService, MetadataService};
