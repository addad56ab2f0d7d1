//! # chatcache-store
//!
//! Storage collaborators of the chat cache:
//!
//! - [`BlobStorage`], the async key/value contract the cache is persisted
//!   through, with a SQLite backend ([`SqliteBlobStorage`], wrapping a
//!   migrated [`Database`]) and an in-memory one ([`MemoryBlobStorage`]);
//! - [`EntityStores`], the in-memory keyed maps holding the client's live
//!   chats, users, groups, files and options.

pub mod blob_storage;
pub mod database;
pub mod entities;
pub mod migrations;
pub mod records;

mod error;

pub use blob_storage::{BlobStorage, MemoryBlobStorage, SqliteBlobStorage};
pub use database::Database;
pub use entities::{Entity, EntityStore, EntityStores, FileStore, OptionStore};
pub use error::{Result, StoreError};
