//! # chatcache-shared
//!
//! Domain types shared by the storage layer and the cache synchronizer:
//! entity records, typed identifiers, record constants and the `data:` URL
//! codec used for file payloads.

pub mod constants;
pub mod data_url;
pub mod error;
pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
