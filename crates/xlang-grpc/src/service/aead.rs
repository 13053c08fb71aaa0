//! Aead service: encryption and decryption under a caller-supplied keyset

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::warn;
use xlang_crypto::error::Result as CryptoResult;
use xlang_crypto::{Aead as _, Bootstrap, Catalog, InitError, KeysetHandle};

use crate::proto::aead_decrypt_response::Result as DecryptResult;
use crate::proto::aead_encrypt_response::Result as EncryptResult;
use crate::proto::aead_server::Aead;
use crate::proto::{AeadDecryptRequest, AeadDecryptResponse, AeadEncryptRequest, AeadEncryptResponse};

/// Implementation of the Aead service
#[derive(Debug, Clone)]
pub struct AeadService {
    catalog: Arc<Catalog>,
}

impl AeadService {
    /// Create a new service instance
    ///
    /// # Errors
    /// Returns `InitError::NotReady` unless the bootstrap succeeded.
    pub fn new(bootstrap: &Bootstrap) -> Result<Self, InitError> {
        Ok(Self {
            catalog: bootstrap.catalog()?,
        })
    }

    fn seal(&self, req: &AeadEncryptRequest) -> CryptoResult<Vec<u8>> {
        KeysetHandle::read(&req.keyset)?
            .aead(&self.catalog)?
            .encrypt(&req.plaintext, &req.associated_data)
    }

    fn open(&self, req: &AeadDecryptRequest) -> CryptoResult<Vec<u8>> {
        KeysetHandle::read(&req.keyset)?
            .aead(&self.catalog)?
            .decrypt(&req.ciphertext, &req.associated_data)
    }
}

#[tonic::async_trait]
impl Aead for AeadService {
    async fn encrypt(
        &self,
        request: Request<AeadEncryptRequest>,
    ) -> Result<Response<AeadEncryptResponse>, Status> {
        let req = request.into_inner();

        let result = match self.seal(&req) {
            Ok(ciphertext) => EncryptResult::Ciphertext(ciphertext),
            Err(e) => {
                warn!(error = %e, "encrypt failed");
                EncryptResult::Err(e.to_string())
            }
        };

        Ok(Response::new(AeadEncryptResponse {
            result: Some(result),
        }))
    }

    async fn decrypt(
        &self,
        request: Request<AeadDecryptRequest>,
    ) -> Result<Response<AeadDecryptResponse>, Status> {
        let req = request.into_inner();

        let result = match self.open(&req) {
            Ok(plaintext) => DecryptResult::Plaintext(plaintext),
            Err(e) => {
                warn!(error = %e, "decrypt failed");
                DecryptResult::Err(e.to_string())
            }
        };

        Ok(Response::new(AeadDecryptResponse {
            result: Some(result),
        }))
    }
}
