//! Metadata service: identifies this implementation to the test driver

use tonic::{Request, Response, Status};
use xlang_crypto::{Bootstrap, InitError};

use crate::proto::metadata_server::Metadata;
use crate::proto::{ServerInfoRequest, ServerInfoResponse};

/// Language reported in `GetServerInfo`
pub const LANGUAGE: &str = "rust";

/// Implementation of the Metadata service
#[derive(Debug, Clone, Copy)]
pub struct MetadataService {
    _ready: (),
}

impl MetadataService {
    /// Create a new service instance
    ///
    /// # Errors
    /// Returns `InitError::NotReady` unless the bootstrap succeeded, like
    /// every other capability service.
    pub fn new(bootstrap: &Bootstrap) -> Result<Self, InitError> {
        if !bootstrap.is_ready() {
            return Err(InitError::NotReady);
        }
        Ok(Self { _ready: () })
    }
}

#[tonic::async_trait]
impl Metadata for MetadataService {
    async fn get_server_info(
        &self,
        _request: Request<ServerInfoRequest>,
    ) -> Result<Response<ServerInfoResponse>, Status> {
        Ok(Response::new(ServerInfoResponse {
            language: LANGUAGE.to_string(),
            tink_version: xlang_crypto::VERSION.to_string(),
        }))
    }
}
