//! AEAD primitive set
//!
//! Output prefixes identify which key produced a ciphertext:
//! - `TINK`: `0x01 || key_id (big endian)`
//! - `LEGACY`, `CRUNCHY`: `0x00 || key_id (big endian)`
//! - `RAW`: no prefix
//!
//! Encryption always uses the primary key. Decryption tries keys whose
//! prefix matches first, then every `RAW` key on the full ciphertext.

use tracing::debug;

use super::Aead;
use crate::catalog::Catalog;
use crate::error::{CryptoError, Result};
use crate::keyset::KeysetHandle;
use crate::proto::{KeyStatusType, OutputPrefixType};

const PREFIX_SIZE: usize = 5;
const TINK_START_BYTE: u8 = 0x01;
const LEGACY_START_BYTE: u8 = 0x00;

fn output_prefix(prefix_type: OutputPrefixType, key_id: u32) -> Result<Vec<u8>> {
    let start = match prefix_type {
        OutputPrefixType::Raw => return Ok(Vec::new()),
        OutputPrefixType::Tink => TINK_START_BYTE,
        OutputPrefixType::Legacy | OutputPrefixType::Crunchy => LEGACY_START_BYTE,
        OutputPrefixType::UnknownPrefix => {
            return Err(CryptoError::InvalidKeyset(format!(
                "key {key_id} has unknown output prefix type"
            )))
        }
    };

    let mut prefix = Vec::with_capacity(PREFIX_SIZE);
    prefix.push(start);
    prefix.extend_from_slice(&key_id.to_be_bytes());
    Ok(prefix)
}

struct Entry {
    key_id: u32,
    prefix: Vec<u8>,
    primitive: Box<dyn Aead>,
}

/// AEAD over every enabled key of a keyset
pub struct AeadSet {
    primary: usize,
    entries: Vec<Entry>,
}

impl AeadSet {
    /// Instantiate one primitive per enabled key
    ///
    /// # Errors
    /// Returns error if any enabled key's type is not in the catalog or its
    /// key material is rejected by the key manager.
    pub fn new(handle: &KeysetHandle, catalog: &Catalog) -> Result<Self> {
        let keyset = handle.keyset();
        let mut entries = Vec::with_capacity(keyset.key.len());
        let mut primary = None;

        for key in &keyset.key {
            if key.status() != KeyStatusType::Enabled {
                continue;
            }
            let key_data = key.key_data.as_ref().ok_or_else(|| {
                CryptoError::InvalidKeyset(format!("key {} has no key data", key.key_id))
            })?;
            let primitive = catalog
                .key_manager(&key_data.type_url)?
                .aead(&key_data.value)?;

            if key.key_id == keyset.primary_key_id {
                primary = Some(entries.len());
            }
            entries.push(Entry {
                key_id: key.key_id,
                prefix: output_prefix(key.output_prefix_type(), key.key_id)?,
                primitive,
            });
        }

        let primary = primary.ok_or_else(|| {
            CryptoError::InvalidKeyset("keyset doesn't contain a valid primary key".to_string())
        })?;
        Ok(Self { primary, entries })
    }

    /// Id of the key used for encryption
    pub fn primary_key_id(&self) -> u32 {
        self.entries[self.primary].key_id
    }
}

impl Aead for AeadSet {
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        let primary = &self.entries[self.primary];
        let body = primary.primitive.encrypt(plaintext, associated_data)?;

        let mut out = Vec::with_capacity(primary.prefix.len() + body.len());
        out.extend_from_slice(&primary.prefix);
        out.extend_from_slice(&body);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() > PREFIX_SIZE {
            let (prefix, body) = ciphertext.split_at(PREFIX_SIZE);
            for entry in self.entries.iter().filter(|e| e.prefix == prefix) {
                match entry.primitive.decrypt(body, associated_data) {
                    Ok(plaintext) => return Ok(plaintext),
                    Err(e) => debug!(key_id = entry.key_id, error = %e, "prefixed key failed"),
                }
            }
        }

        for entry in self.entries.iter().filter(|e| e.prefix.is_empty()) {
            match entry.primitive.decrypt(ciphertext, associated_data) {
                Ok(plaintext) => return Ok(plaintext),
                Err(e) => debug!(key_id = entry.key_id, error = %e, "raw key failed"),
            }
        }

        Err(CryptoError::DecryptionFailed)
    }
}
