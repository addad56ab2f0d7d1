//! Conversion of in-memory file payloads into their persisted text form.

use async_trait::async_trait;
use bytes::Bytes;

use chatcache_shared::data_url;
use chatcache_shared::FileId;

use crate::error::EncodeError;

#[async_trait]
pub trait BlobEncoder: Send + Sync {
    /// Turn `payload` into a URL the file store can register for `file_id`.
    async fn encode(&self, file_id: FileId, payload: Bytes) -> Result<String, EncodeError>;
}

/// Encodes payloads as base64 `data:` URLs.
#[derive(Debug, Clone)]
pub struct DataUrlEncoder {
    max_size: usize,
}

impl DataUrlEncoder {
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }
}

#[async_trait]
impl BlobEncoder for DataUrlEncoder {
    async fn encode(&self, _file_id: FileId, payload: Bytes) -> Result<String, EncodeError> {
        Ok(data_url::encode(&payload, self.max_size)?)
    }
}
