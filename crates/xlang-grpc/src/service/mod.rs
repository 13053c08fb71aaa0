//! Capability services
//!
//! Each service exposes one slice of the library over gRPC. They hold
//! nothing but a shared handle to the read-only catalog, and they can only
//! be built from a `Ready` bootstrap. Library failures are returned in the
//! response's `err` field; a `Status` error is reserved for transport-level
//! problems tonic itself reports.

mod aead;
mod keyset;
mod metadata;

pub use aead::AeadService;
pub use keyset::KeysetService;
pub use metadata::MetadataService;
