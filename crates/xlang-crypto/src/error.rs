//! Error types for the primitive library

use thiserror::Error;

/// Result alias for library operations
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Per-operation failures
///
/// These surface to the remote test driver as the `err` variant of a
/// response; none of them is fatal to the process.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// No key manager registered for the type URL
    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),

    /// Serialized protobuf could not be decoded
    #[error("failed to decode {what}: {source}")]
    Decode {
        /// Which message was being decoded
        what: &'static str,
        /// Underlying prost error
        #[source]
        source: prost::DecodeError,
    },

    /// Key or key format carries parameters this library rejects
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Keyset structure is invalid
    #[error("invalid keyset: {0}")]
    InvalidKeyset(String),

    /// Encryption failed inside the AEAD implementation
    #[error("encryption failed")]
    EncryptionFailed,

    /// No key in the keyset could authenticate the ciphertext
    #[error("decryption failed")]
    DecryptionFailed,
}

impl CryptoError {
    pub(crate) fn decode(what: &'static str, source: prost::DecodeError) -> Self {
        Self::Decode { what, source }
    }
}

/// Library bootstrap failures
///
/// Any of these is fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    /// Two key managers claim the same type URL
    #[error("duplicate key manager registered for {0}")]
    DuplicateKeyManager(String),

    /// A registration step failed
    #[error("primitive registration failed: {0}")]
    Registration(String),

    /// `initialize` was called on a bootstrap that already ran
    #[error("library bootstrap was already attempted")]
    AlreadyAttempted,

    /// Catalog requested before a successful bootstrap
    #[error("library bootstrap has not completed")]
    NotReady,
}
