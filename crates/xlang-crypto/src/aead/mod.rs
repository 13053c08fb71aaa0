//! Authenticated encryption with associated data
//!
//! [`Aead`] is the primitive every AEAD key manager produces. [`AeadSet`]
//! wraps all keys of a keyset and handles output prefixes. The concrete
//! ciphers come from the RustCrypto `aes-gcm` and `chacha20poly1305` crates.

mod chacha;
mod gcm;
mod set;

pub use chacha::{
    ChaCha20Poly1305KeyManager, XChaCha20Poly1305KeyManager, CHACHA20_POLY1305_TYPE_URL,
    XCHACHA20_POLY1305_TYPE_URL,
};
pub use gcm::{AesGcmKeyManager, AES_GCM_TYPE_URL};
pub use set::AeadSet;

use ::aead::generic_array::typenum::Unsigned;
use ::aead::generic_array::GenericArray;
use ::aead::{Aead as RawAead, AeadCore, OsRng, Payload};

use crate::catalog::Catalog;
use crate::error::{CryptoError, InitError, Result};

/// Authenticated encryption with associated data
pub trait Aead: Send + Sync {
    /// Encrypt `plaintext`, binding `associated_data` to the ciphertext
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt and authenticate `ciphertext` against `associated_data`
    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>>;
}

/// Register every AEAD key manager into `catalog`
pub fn register(catalog: &mut Catalog) -> std::result::Result<(), InitError> {
    catalog.register(AesGcmKeyManager)?;
    catalog.register(ChaCha20Poly1305KeyManager)?;
    catalog.register(XChaCha20Poly1305KeyManager)?;
    Ok(())
}

/// Encrypt under a fresh random nonce; output is `nonce || ciphertext || tag`
fn seal<C>(cipher: &C, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>>
where
    C: RawAead + AeadCore,
{
    let nonce = C::generate_nonce(&mut OsRng);
    let body = cipher
        .encrypt(&nonce, Payload { msg: plaintext, aad: associated_data })
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut out = Vec::with_capacity(nonce.len() + body.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Inverse of [`seal`]
fn open<C>(cipher: &C, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>>
where
    C: RawAead + AeadCore,
{
    let nonce_len = <C::NonceSize as Unsigned>::USIZE;
    if ciphertext.len() < nonce_len + <C::TagSize as Unsigned>::USIZE {
        return Err(CryptoError::DecryptionFailed);
    }

    let (nonce, body) = ciphertext.split_at(nonce_len);
    cipher
        .decrypt(GenericArray::from_slice(nonce), Payload { msg: body, aad: associated_data })
        .map_err(|_| CryptoError::DecryptionFailed)
}

/// Fill a fresh buffer with OS randomness
fn random_bytes(len: usize) -> Vec<u8> {
    use ::aead::rand_core::RngCore;

    let mut bytes = vec![0u8; len];
    OsRng.fill_bytes(&mut bytes);
    bytes
}
