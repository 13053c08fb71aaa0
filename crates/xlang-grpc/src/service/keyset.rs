//! Keyset service: keyset generation from serialized templates

use std::sync::Arc;

use tonic::{Request, Response, Status};
use tracing::warn;
use xlang_crypto::{templates, Bootstrap, Catalog, InitError, KeysetHandle};

use crate::proto::keyset_generate_response::Result as GenerateResult;
use crate::proto::keyset_server::Keyset;
use crate::proto::{KeysetGenerateRequest, KeysetGenerateResponse};

/// Implementation of the Keyset service
#[derive(Debug, Clone)]
pub struct KeysetService {
    catalog: Arc<Catalog>,
}

impl KeysetService {
    /// Create a new service instance
    ///
    /// # Errors
    /// Returns `InitError::NotReady` unless the bootstrap succeeded.
    pub fn new(bootstrap: &Bootstrap) -> Result<Self, InitError> {
        Ok(Self {
            catalog: bootstrap.catalog()?,
        })
    }

    fn generate_keyset(&self, template: &[u8]) -> xlang_crypto::error::Result<Vec<u8>> {
        let template = templates::read(template)?;
        let handle = KeysetHandle::generate_new(&self.catalog, &template)?;
        Ok(handle.write())
    }
}

#[tonic::async_trait]
impl Keyset for KeysetService {
    async fn generate(
        &self,
        request: Request<KeysetGenerateRequest>,
    ) -> Result<Response<KeysetGenerateResponse>, Status> {
        let req = request.into_inner();

        let result = match self.generate_keyset(&req.template) {
            Ok(keyset) => GenerateResult::Keyset(keyset),
            Err(e) => {
                warn!(error = %e, "keyset generation failed");
                GenerateResult::Err(e.to_string())
            }
        };

        Ok(Response::new(KeysetGenerateResponse {
            result: Some(result),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    fn service() -> KeysetService {
        let mut bootstrap = Bootstrap::new();
        bootstrap.initialize().unwrap();
        KeysetService::new(&bootstrap).unwrap()
    }

    async fn generate(service: &KeysetService, template: Vec<u8>) -> GenerateResult {
        service
            .generate(Request::new(KeysetGenerateRequest { template }))
            .await
            .unwrap()
            .into_inner()
            .result
            .unwrap()
    }

    #[test]
    fn test_requires_ready_bootstrap() {
        let bootstrap = Bootstrap::new();
        assert_eq!(
            KeysetService::new(&bootstrap).unwrap_err(),
            InitError::NotReady
        );
    }

    #[tokio::test]
    async fn test_generate() {
        let service = service();
        let template = templates::aes256_gcm().encode_to_vec();

        match generate(&service, template).await {
            GenerateResult::Keyset(bytes) => {
                let handle = KeysetHandle::read(&bytes).unwrap();
                assert_eq!(handle.keyset().key.len(), 1);
            }
            GenerateResult::Err(e) => panic!("unexpected error: {}", e),
        }
    }

    #[tokio::test]
    async fn test_generate_malformed_template() {
        let service = service();
        match generate(&service, vec![0xff, 0xff, 0xff]).await {
            GenerateResult::Err(e) => assert!(e.contains("KeyTemplate"), "{}", e),
            GenerateResult::Keyset(_) => panic!("expected an error"),
        }
    }

    #[tokio::test]
    async fn test_generate_unsupported_type() {
        let service = service();
        let mut template = templates::aes128_gcm();
        template.type_url = "type.googleapis.com/google.crypto.tink.AesEaxKey".to_string();

        match generate(&service, template.encode_to_vec()).await {
            GenerateResult::Err(e) => assert!(e.contains("unsupported key type")),
            GenerateResult::Keyset(_) => panic!("expected an error"),
        }
    }
}
