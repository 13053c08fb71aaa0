//! Key templates for the registered AEAD key types
//!
//! Test drivers normally send their own serialized templates; these mirror
//! the standard ones so in-process callers and tests need not build them.

use prost::Message;

use crate::aead::{AES_GCM_TYPE_URL, CHACHA20_POLY1305_TYPE_URL, XCHACHA20_POLY1305_TYPE_URL};
use crate::error::{CryptoError, Result};
use crate::proto::{
    AesGcmKeyFormat, ChaCha20Poly1305KeyFormat, KeyTemplate, OutputPrefixType,
    XChaCha20Poly1305KeyFormat,
};

/// Decode a template received over the wire
pub fn read(serialized: &[u8]) -> Result<KeyTemplate> {
    KeyTemplate::decode(serialized).map_err(|e| CryptoError::decode("KeyTemplate", e))
}

fn aes_gcm(key_size: u32, prefix: OutputPrefixType) -> KeyTemplate {
    KeyTemplate {
        type_url: AES_GCM_TYPE_URL.to_string(),
        value: AesGcmKeyFormat { key_size, version: 0 }.encode_to_vec(),
        output_prefix_type: prefix as i32,
    }
}

/// AES-GCM, 16-byte key, TINK prefix
pub fn aes128_gcm() -> KeyTemplate {
    aes_gcm(16, OutputPrefixType::Tink)
}

/// AES-GCM, 32-byte key, TINK prefix
pub fn aes256_gcm() -> KeyTemplate {
    aes_gcm(32, OutputPrefixType::Tink)
}

/// AES-GCM, 16-byte key, no prefix
pub fn aes128_gcm_raw() -> KeyTemplate {
    aes_gcm(16, OutputPrefixType::Raw)
}

/// AES-GCM, 32-byte key, no prefix
pub fn aes256_gcm_raw() -> KeyTemplate {
    aes_gcm(32, OutputPrefixType::Raw)
}

/// ChaCha20-Poly1305, TINK prefix
pub fn chacha20_poly1305() -> KeyTemplate {
    KeyTemplate {
        type_url: CHACHA20_POLY1305_TYPE_URL.to_string(),
        value: ChaCha20Poly1305KeyFormat {}.encode_to_vec(),
        output_prefix_type: OutputPrefixType::Tink as i32,
    }
}

/// XChaCha20-Poly1305, TINK prefix
pub fn xchacha20_poly1305() -> KeyTemplate {
    KeyTemplate {
        type_url: XCHACHA20_POLY1305_TYPE_URL.to_string(),
        value: XChaCha20Poly1305KeyFormat { version: 0 }.encode_to_vec(),
        output_prefix_type: OutputPrefixType::Tink as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aes_templates() {
        let template = aes256_gcm();
        assert_eq!(template.type_url, AES_GCM_TYPE_URL);
        assert_eq!(template.output_prefix_type, OutputPrefixType::Tink as i32);

        let format = AesGcmKeyFormat::decode(template.value.as_slice()).unwrap();
        assert_eq!(format.key_size, 32);

        assert_eq!(aes128_gcm_raw().output_prefix_type, OutputPrefixType::Raw as i32);
    }

    #[test]
    fn test_read() {
        let template = chacha20_poly1305();
        assert_eq!(read(&template.encode_to_vec()).unwrap(), template);
        assert!(matches!(
            read(b"\xff\xff"),
            Err(CryptoError::Decode { what: "KeyTemplate", .. })
        ));
    }
}
