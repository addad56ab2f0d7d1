use chatcache_shared::error::DataUrlError;
use chatcache_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failure to turn one file payload into its persisted text form.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("Data URL error: {0}")]
    DataUrl(#[from] DataUrlError),

    #[error("Encoder failed: {0}")]
    Failed(String),
}
