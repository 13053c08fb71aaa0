//! ChaCha20-Poly1305 and XChaCha20-Poly1305 key managers
//!
//! Both take a 32-byte key. They differ only in nonce length (12 vs 24
//! bytes), which the shared `seal`/`open` helpers read from the cipher type.

use ::aead::KeyInit;
use chacha20poly1305::{ChaCha20Poly1305, XChaCha20Poly1305};
use prost::Message;

use super::{open, random_bytes, seal, Aead};
use crate::error::{CryptoError, Result};
use crate::key_manager::KeyManager;
use crate::proto::{
    ChaCha20Poly1305Key, ChaCha20Poly1305KeyFormat, XChaCha20Poly1305Key,
    XChaCha20Poly1305KeyFormat,
};

/// Type URL of ChaCha20-Poly1305 keys
pub const CHACHA20_POLY1305_TYPE_URL: &str =
    "type.googleapis.com/google.crypto.tink.ChaCha20Poly1305Key";

/// Type URL of XChaCha20-Poly1305 keys
pub const XCHACHA20_POLY1305_TYPE_URL: &str =
    "type.googleapis.com/google.crypto.tink.XChaCha20Poly1305Key";

const KEY_SIZE: usize = 32;
const KEY_VERSION: u32 = 0;

fn validate(version: u32, key_value: &[u8]) -> Result<()> {
    if version != KEY_VERSION {
        return Err(CryptoError::InvalidKey(format!(
            "unsupported key version {version}"
        )));
    }
    if key_value.len() != KEY_SIZE {
        return Err(CryptoError::InvalidKey(format!(
            "key must be {KEY_SIZE} bytes, got {}",
            key_value.len()
        )));
    }
    Ok(())
}

struct Cipher<C>(C);

impl<C> Aead for Cipher<C>
where
    C: ::aead::Aead + Send + Sync,
{
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        seal(&self.0, plaintext, associated_data)
    }

    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        open(&self.0, ciphertext, associated_data)
    }
}

fn instantiate<C>(key_value: &[u8]) -> Result<Box<dyn Aead>>
where
    C: ::aead::Aead + KeyInit + Send + Sync + 'static,
{
    let cipher = C::new_from_slice(key_value)
        .map_err(|_| CryptoError::InvalidKey("ChaCha20 key rejected".to_string()))?;
    Ok(Box::new(Cipher(cipher)))
}

/// ChaCha20-Poly1305 (RFC 8439)
#[derive(Debug, Clone, Copy, Default)]
pub struct ChaCha20Poly1305KeyManager;

impl KeyManager for ChaCha20Poly1305KeyManager {
    fn type_url(&self) -> &'static str {
        CHACHA20_POLY1305_TYPE_URL
    }

    fn new_key(&self, serialized_format: &[u8]) -> Result<Vec<u8>> {
        ChaCha20Poly1305KeyFormat::decode(serialized_format)
            .map_err(|e| CryptoError::decode("ChaCha20Poly1305KeyFormat", e))?;

        let key = ChaCha20Poly1305Key {
            version: KEY_VERSION,
            key_value: random_bytes(KEY_SIZE),
        };
        Ok(key.encode_to_vec())
    }

    fn aead(&self, serialized_key: &[u8]) -> Result<Box<dyn Aead>> {
        let key = ChaCha20Poly1305Key::decode(serialized_key)
            .map_err(|e| CryptoError::decode("ChaCha20Poly1305Key", e))?;
        validate(key.version, &key.key_value)?;
        instantiate::<ChaCha20Poly1305>(&key.key_value)
    }
}

/// XChaCha20-Poly1305 (extended 24-byte nonce)
#[derive(Debug, Clone, Copy, Default)]
pub struct XChaCha20Poly1305KeyManager;

impl KeyManager for XChaCha20Poly1305KeyManager {
    fn type_url(&self) -> &'static str {
        XCHACHA20_POLY1305_TYPE_URL
    }

    fn new_key(&self, serialized_format: &[u8]) -> Result<Vec<u8>> {
        let format = XChaCha20Poly1305KeyFormat::decode(serialized_format)
            .map_err(|e| CryptoError::decode("XChaCha20Poly1305KeyFormat", e))?;
        if format.version != KEY_VERSION {
            return Err(CryptoError::InvalidKey(format!(
                "unsupported key format version {}",
                format.version
            )));
        }

        let key = XChaCha20Poly1305Key {
            version: KEY_VERSION,
            key_value: random_bytes(KEY_SIZE),
        };
        Ok(key.encode_to_vec())
    }

    fn aead(&self, serialized_key: &[u8]) -> Result<Box<dyn Aead>> {
        let key = XChaCha20Poly1305Key::decode(serialized_key)
            .map_err(|e| CryptoError::decode("XChaCha20Poly1305Key", e))?;
        validate(key.version, &key.key_value)?;
        instantiate::<XChaCha20Poly1305>(&key.key_value)
    }
}
