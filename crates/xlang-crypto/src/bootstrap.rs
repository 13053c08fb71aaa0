//! Library bootstrap
//!
//! Registration of the primitive catalog happens exactly once, before any
//! capability service exists. The outcome is kept as an explicit state value
//! owned by the caller rather than as hidden global state: services take the
//! catalog from a `Ready` bootstrap or refuse to be built.
//!
//! ```
//! use xlang_crypto::{Bootstrap, InitError};
//!
//! let mut bootstrap = Bootstrap::new();
//! assert_eq!(bootstrap.catalog().unwrap_err(), InitError::NotReady);
//!
//! bootstrap.initialize().unwrap();
//! assert!(bootstrap.is_ready());
//! assert!(bootstrap.catalog().unwrap().len() > 0);
//!
//! // No second attempt, whatever the first outcome was.
//! assert_eq!(bootstrap.initialize(), Err(InitError::AlreadyAttempted));
//! ```

use std::sync::Arc;

use tracing::{error, info};

use crate::catalog::Catalog;
use crate::error::InitError;

/// Lifecycle of the primitive catalog
#[derive(Debug, Clone)]
pub enum BootstrapState {
    /// Registration has not been attempted
    Uninitialized,
    /// Catalog registered; read-only from here on
    Ready(Arc<Catalog>),
    /// Registration was attempted and failed
    Failed(InitError),
}

/// One-shot registration of the primitive catalog
#[derive(Debug, Clone)]
pub struct Bootstrap {
    state: BootstrapState,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self::new()
    }
}

impl Bootstrap {
    /// Create an uninitialized bootstrap
    pub fn new() -> Self {
        Self {
            state: BootstrapState::Uninitialized,
        }
    }

    /// Register every primitive this library supports
    ///
    /// # Errors
    /// Returns `InitError::AlreadyAttempted` on any second call, or the
    /// registration failure itself.
    pub fn initialize(&mut self) -> Result<(), InitError> {
        self.initialize_with(crate::aead::register)
    }

    /// Run a custom registration step instead of the default catalog
    pub fn initialize_with<F>(&mut self, register: F) -> Result<(), InitError>
    where
        F: FnOnce(&mut Catalog) -> Result<(), InitError>,
    {
        if !matches!(self.state, BootstrapState::Uninitialized) {
            return Err(InitError::AlreadyAttempted);
        }

        let mut catalog = Catalog::new();
        match register(&mut catalog) {
            Ok(()) => {
                info!(key_types = catalog.len(), "primitive catalog registered");
                self.state = BootstrapState::Ready(Arc::new(catalog));
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "primitive registration failed");
                self.state = BootstrapState::Failed(e.clone());
                Err(e)
            }
        }
    }

    /// Current state
    pub fn state(&self) -> &BootstrapState {
        &self.state
    }

    /// True once registration succeeded
    pub fn is_ready(&self) -> bool {
        matches!(self.state, BootstrapState::Ready(_))
    }

    /// Shared handle to the registered catalog
    ///
    /// # Errors
    /// Returns `InitError::NotReady` unless registration succeeded.
    pub fn catalog(&self) -> Result<Arc<Catalog>, InitError> {
        match &self.state {
            BootstrapState::Ready(catalog) => Ok(Arc::clone(catalog)),
            _ => Err(InitError::NotReady),
        }
    }
}
