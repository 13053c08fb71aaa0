//! AES-GCM key manager

use ::aead::KeyInit;
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use prost::Message;

use super::{open, random_bytes, seal, Aead};
use crate::error::{CryptoError, Result};
use crate::key_manager::KeyManager;
use crate::proto::{AesGcmKey, AesGcmKeyFormat};

/// Type URL of AES-GCM keys
pub const AES_GCM_TYPE_URL: &str = "type.googleapis.com/google.crypto.tink.AesGcmKey";

const KEY_VERSION: u32 = 0;

fn validate_key_size(size: usize) -> Result<()> {
    match size {
        16 | 32 => Ok(()),
        other => Err(CryptoError::InvalidKey(format!(
            "AES-GCM key size must be 16 or 32 bytes, got {other}"
        ))),
    }
}

enum AesGcm {
    Aes128(Aes128Gcm),
    Aes256(Aes256Gcm),
}

impl Aead for AesGcm {
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        match self {
            AesGcm::Aes128(cipher) => seal(cipher, plaintext, associated_data),
            AesGcm::Aes256(cipher) => seal(cipher, plaintext, associated_data),
        }
    }

    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        match self {
            AesGcm::Aes128(cipher) => open(cipher, ciphertext, associated_data),
            AesGcm::Aes256(cipher) => open(cipher, ciphertext, associated_data),
        }
    }
}

/// Generates AES-GCM keys and instantiates AES-GCM primitives
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmKeyManager;

impl KeyManager for AesGcmKeyManager {
    fn type_url(&self) -> &'static str {
        AES_GCM_TYPE_URL
    }

    fn new_key(&self, serialized_format: &[u8]) -> Result<Vec<u8>> {
        let format = AesGcmKeyFormat::decode(serialized_format)
            .map_err(|e| CryptoError::decode("AesGcmKeyFormat", e))?;
        let key_size = format.key_size as usize;
        validate_key_size(key_size)?;

        let key = AesGcmKey {
            version: KEY_VERSION,
            key_value: random_bytes(key_size),
        };
        Ok(key.encode_to_vec())
    }

    fn aead(&self, serialized_key: &[u8]) -> Result<Box<dyn Aead>> {
        let key = AesGcmKey::decode(serialized_key)
            .map_err(|e| CryptoError::decode("AesGcmKey", e))?;
        if key.version != KEY_VERSION {
            return Err(CryptoError::InvalidKey(format!(
                "unsupported AES-GCM key version {}",
                key.version
            )));
        }
        validate_key_size(key.key_value.len())?;

        // Length is validated above, so construction cannot fail.
        let invalid = |_| CryptoError::InvalidKey("AES-GCM key rejected".to_string());
        let cipher = if key.key_value.len() == 16 {
            AesGcm::Aes128(Aes128Gcm::new_from_slice(&key.key_value).map_err(invalid)?)
        } else {
            AesGcm::Aes256(Aes256Gcm::new_from_slice(&key.key_value).map_err(invalid)?)
        };
        Ok(Box::new(cipher))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(key_size: u32) -> Vec<u8> {
        AesGcmKeyFormat { key_size, version: 0 }.encode_to_vec()
    }

    #[test]
    fn test_new_key_sizes() {
        for size in [16u32, 32] {
            let key = AesGcmKeyManager.new_key(&format(size)).unwrap();
            let key = AesGcmKey::decode(key.as_slice()).unwrap();
            assert_eq!(key.key_value.len(), size as usize);
            assert_eq!(key.version, 0);
        }
    }

    #[test]
    fn test_new_key_rejects_bad_size() {
        let result = AesGcmKeyManager.new_key(&format(24));
        assert!(matches!(result, Err(CryptoError::InvalidKey(_))));
    }

    #[test]
    fn test_encrypt_decrypt() {
        let key = AesGcmKeyManager.new_key(&format(16)).unwrap();
        let aead = AesGcmKeyManager.aead(&key).unwrap();

        let ciphertext = aead.encrypt(b"hello", b"ad").unwrap();
        // 12-byte nonce + 5-byte message + 16-byte tag
        assert_eq!(ciphertext.len(), 12 + 5 + 16);
        assert_eq!(aead.decrypt(&ciphertext, b"ad").unwrap(), b"hello");
    }

    #[test]
    fn test_wrong_associated_data_fails() {
        let key = AesGcmKeyManager.new_key(&format(32)).unwrap();
        let aead = AesGcmKeyManager.aead(&key).unwrap();

        let ciphertext = aead.encrypt(b"hello", b"ad").unwrap();
        assert!(matches!(
            aead.decrypt(&ciphertext, b"other"),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_short_ciphertext_fails() {
        let key = AesGcmKeyManager.new_key(&format(16)).unwrap();
        let aead = AesGcmKeyManager.aead(&key).unwrap();
        assert!(matches!(
            aead.decrypt(&[0u8; 10], b""),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let key = AesGcmKey {
            version: 1,
            key_value: vec![0u8; 16],
        };
        let result = AesGcmKeyManager.aead(&key.encode_to_vec());
        assert!(matches!(result, Err(CryptoError::InvalidKey(_))));
    }

    #[test]
    fn test_rejects_garbage_key() {
        let result = AesGcmKeyManager.aead(&[0xff, 0xff, 0xff]);
        assert!(matches!(result, Err(CryptoError::Decode { .. })));
    }
}
