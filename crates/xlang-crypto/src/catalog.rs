//! Primitive catalog
//!
//! Maps key type URLs to the key manager that handles them. The catalog is
//! filled exactly once by [`crate::Bootstrap`] and is read-only afterwards.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{CryptoError, InitError, Result};
use crate::key_manager::KeyManager;

/// Registered key managers, keyed by type URL
#[derive(Default, Clone)]
pub struct Catalog {
    managers: HashMap<String, Arc<dyn KeyManager>>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key manager
    ///
    /// # Errors
    /// Returns `InitError::DuplicateKeyManager` if the type URL is taken.
    pub fn register<M>(&mut self, manager: M) -> std::result::Result<(), InitError>
    where
        M: KeyManager + 'static,
    {
        let type_url = manager.type_url();
        if self.managers.contains_key(type_url) {
            return Err(InitError::DuplicateKeyManager(type_url.to_string()));
        }
        debug!(type_url, "registered key manager");
        self.managers.insert(type_url.to_string(), Arc::new(manager));
        Ok(())
    }

    /// Look up the key manager for a type URL
    pub fn key_manager(&self, type_url: &str) -> Result<&dyn KeyManager> {
        self.managers
            .get(type_url)
            .map(|m| m.as_ref())
            .ok_or_else(|| CryptoError::UnsupportedKeyType(type_url.to_string()))
    }

    /// Whether a type URL is registered
    pub fn supports(&self, type_url: &str) -> bool {
        self.managers.contains_key(type_url)
    }

    /// Registered type URLs, sorted
    pub fn type_urls(&self) -> Vec<&str> {
        let mut urls: Vec<&str> = self.managers.keys().map(String::as_str).collect();
        urls.sort_unstable();
        urls
    }

    /// Number of registered key managers
    pub fn len(&self) -> usize {
        self.managers.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("type_urls", &self.type_urls())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aead::{AesGcmKeyManager, ChaCha20Poly1305KeyManager, AES_GCM_TYPE_URL};

    #[test]
    fn test_register_and_lookup() {
        let mut catalog = Catalog::new();
        assert!(catalog.is_empty());

        catalog.register(AesGcmKeyManager).unwrap();
        catalog.register(ChaCha20Poly1305KeyManager).unwrap();

        assert_eq!(catalog.len(), 2);
        assert!(catalog.supports(AES_GCM_TYPE_URL));
        assert_eq!(
            catalog.key_manager(AES_GCM_TYPE_URL).unwrap().type_url(),
            AES_GCM_TYPE_URL
        );
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut catalog = Catalog::new();
        catalog.register(AesGcmKeyManager).unwrap();

        let err = catalog.register(AesGcmKeyManager).unwrap_err();
        assert_eq!(err, InitError::DuplicateKeyManager(AES_GCM_TYPE_URL.to_string()));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_unknown_type_url() {
        let catalog = Catalog::new();
        let result = catalog.key_manager("type.googleapis.com/unknown");
        assert!(matches!(result, Err(CryptoError::UnsupportedKeyType(_))));
    }

    #[test]
    fn test_type_urls_sorted() {
        let mut catalog = Catalog::new();
        catalog.register(ChaCha20Poly1305KeyManager).unwrap();
        catalog.register(AesGcmKeyManager).unwrap();

        let urls = catalog.type_urls();
        let mut sorted = urls.clone();
        sorted.sort();
        assert_eq!(urls, sorted);
    }
}
