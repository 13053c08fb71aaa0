//! Keyset handles
//!
//! A [`KeysetHandle`] is a validated `Keyset` message. Keysets cross the
//! wire in their binary protobuf encoding, so every language under test can
//! read what another one generated.

use ::aead::rand_core::RngCore;
use ::aead::OsRng;
use prost::Message;
use tracing::debug;

use crate::aead::AeadSet;
use crate::catalog::Catalog;
use crate::error::{CryptoError, Result};
use crate::proto::{keyset::Key, KeyStatusType, KeyTemplate, Keyset, OutputPrefixType};

/// A validated keyset
#[derive(Debug, Clone, PartialEq)]
pub struct KeysetHandle {
    keyset: Keyset,
}

impl KeysetHandle {
    /// Generate a keyset holding one fresh primary key built from `template`
    ///
    /// # Errors
    /// Returns error if the template's key type is not in the catalog, the
    /// key format is rejected, or the output prefix type is unknown.
    pub fn generate_new(catalog: &Catalog, template: &KeyTemplate) -> Result<Self> {
        let prefix_type = OutputPrefixType::try_from(template.output_prefix_type)
            .ok()
            .filter(|p| *p != OutputPrefixType::UnknownPrefix)
            .ok_or_else(|| {
                CryptoError::InvalidKeyset(format!(
                    "unknown output prefix type {}",
                    template.output_prefix_type
                ))
            })?;

        let manager = catalog.key_manager(&template.type_url)?;
        let key_data = manager.new_key_data(&template.value)?;
        let key_id = new_key_id(&[]);

        let keyset = Keyset {
            primary_key_id: key_id,
            key: vec![Key {
                key_data: Some(key_data),
                status: KeyStatusType::Enabled as i32,
                key_id,
                output_prefix_type: prefix_type as i32,
            }],
        };
        debug!(type_url = %template.type_url, key_id, "generated keyset");

        Self::new(keyset)
    }

    /// Wrap an already-decoded keyset after validating it
    pub fn new(keyset: Keyset) -> Result<Self> {
        validate(&keyset)?;
        Ok(Self { keyset })
    }

    /// Decode and validate a binary keyset
    pub fn read(serialized: &[u8]) -> Result<Self> {
        let keyset =
            Keyset::decode(serialized).map_err(|e| CryptoError::decode("Keyset", e))?;
        Self::new(keyset)
    }

    /// Binary protobuf encoding of the keyset
    pub fn write(&self) -> Vec<u8> {
        self.keyset.encode_to_vec()
    }

    /// The underlying keyset message
    pub fn keyset(&self) -> &Keyset {
        &self.keyset
    }

    /// Id of the primary key
    pub fn primary_key_id(&self) -> u32 {
        self.keyset.primary_key_id
    }

    /// Instantiate the AEAD primitive set for this keyset
    pub fn aead(&self, catalog: &Catalog) -> Result<AeadSet> {
        AeadSet::new(self, catalog)
    }
}

/// Random non-zero key id not present in `taken`
fn new_key_id(taken: &[u32]) -> u32 {
    loop {
        let id = OsRng.next_u32();
        if id != 0 && !taken.contains(&id) {
            return id;
        }
    }
}

/// Structural checks every keyset must pass before use
fn validate(keyset: &Keyset) -> Result<()> {
    if keyset.key.is_empty() {
        return Err(CryptoError::InvalidKeyset("keyset is empty".to_string()));
    }

    let mut enabled = 0usize;
    let mut has_primary = false;
    for key in &keyset.key {
        // Every key is checked, whatever its status.
        if key.key_data.is_none() {
            return Err(CryptoError::InvalidKeyset(format!(
                "key {} has no key data",
                key.key_id
            )));
        }
        if key.output_prefix_type() == OutputPrefixType::UnknownPrefix {
            return Err(CryptoError::InvalidKeyset(format!(
                "key {} has unknown output prefix type",
                key.key_id
            )));
        }
        if key.status() == KeyStatusType::UnknownStatus {
            return Err(CryptoError::InvalidKeyset(format!(
                "key {} has unknown status",
                key.key_id
            )));
        }
        if key.status() != KeyStatusType::Enabled {
            continue;
        }
        if key.key_id == keyset.primary_key_id {
            if has_primary {
                return Err(CryptoError::InvalidKeyset(
                    "keyset contains multiple primary keys".to_string(),
                ));
            }
            has_primary = true;
        }
        enabled += 1;
    }

    if enabled == 0 {
        return Err(CryptoError::InvalidKeyset(
            "keyset must contain at least one ENABLED key".to_string(),
        ));
    }
    if !has_primary {
        return Err(CryptoError::InvalidKeyset(
            "keyset doesn't contain a valid primary key".to_string(),
        ));
    }
    Ok(())
}
