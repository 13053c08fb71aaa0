//! Key manager trait
//!
//! One key manager per key type URL. The catalog holds them behind
//! `Arc<dyn KeyManager>` so the services can share a single catalog.

use crate::aead::Aead;
use crate::error::Result;
use crate::proto::{key_data::KeyMaterialType, KeyData};

/// Generates keys for, and instantiates primitives of, one key type
pub trait KeyManager: Send + Sync {
    /// Type URL this manager is registered under
    fn type_url(&self) -> &'static str;

    /// Generate a new serialized key from a serialized key format
    fn new_key(&self, serialized_format: &[u8]) -> Result<Vec<u8>>;

    /// Material type recorded in generated `KeyData`
    fn key_material_type(&self) -> KeyMaterialType {
        KeyMaterialType::Symmetric
    }

    /// Generate a new key wrapped in `KeyData`
    fn new_key_data(&self, serialized_format: &[u8]) -> Result<KeyData> {
        Ok(KeyData {
            type_url: self.type_url().to_string(),
            value: self.new_key(serialized_format)?,
            key_material_type: self.key_material_type() as i32,
        })
    }

    /// Instantiate the AEAD primitive for a serialized key
    fn aead(&self, serialized_key: &[u8]) -> Result<Box<dyn Aead>>;
}
