//! xlang Crypto Library
//!
//! The primitive library driven by the cross-language testing server.
//! It owns the primitive catalog, the key managers registered into it,
//! keyset generation and validation, and the AEAD primitive set that
//! applies output prefixes the same way every other implementation does.
//!
//! ## Key Concepts
//!
//! - **Catalog**: key type URL -> key manager, built once by the bootstrap
//! - **Key Manager**: generates key material and instantiates primitives for one key type
//! - **Keyset**: serialized set of keys with one primary, shared across languages
//! - **Bootstrap**: the one-time registration that turns the catalog `Ready`
//!
//! Nothing in this crate can produce a primitive without a `Ready`
//! [`Bootstrap`]; services obtain the catalog through it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod proto {
    //! Generated keyset and key format messages
    #![allow(missing_docs)]
    include!(concat!(env!("OUT_DIR"), "/google.crypto.tink.rs"));
}

pub mod aead;
pub mod bootstrap;
pub mod catalog;
pub mod error;
pub mod key_manager;
pub mod keyset;
pub mod templates;

/// Library version reported to test drivers
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-exports for convenience
pub use self::aead::{Aead, AeadSet};
pub use bootstrap::{Bootstrap, BootstrapState};
pub use catalog::Catalog;
pub use error::{CryptoError, InitError};
pub use key_manager::KeyManager;
pub use keyset::KeysetHandle;
