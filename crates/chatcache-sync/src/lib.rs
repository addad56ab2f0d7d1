//! # chatcache-sync
//!
//! Keeps a persisted snapshot of a chat client's chat list in step with its
//! live entity stores, so the next start can show the list before the
//! network session is ready.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use chatcache_store::{EntityStores, MemoryBlobStorage};
//! use chatcache_sync::{CacheSynchronizer, SessionEvents, SyncConfig};
//!
//! # async fn demo() {
//! let stores = EntityStores::shared();
//! let events = SessionEvents::new();
//! let sync = CacheSynchronizer::new(
//!     Arc::new(MemoryBlobStorage::new()),
//!     stores.clone(),
//!     SyncConfig::from_env(),
//! );
//! let _subscription = sync.attach(&events);
//!
//! if let Some(chats) = sync.get_chats().await {
//!     // render `chats` right away
//!     sync.save_chats(chats.iter().map(|chat| chat.id).collect());
//! }
//! # }
//! ```

pub mod config;
pub mod encoder;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod restore;
pub mod snapshot;
pub mod synchronizer;
pub mod writer;

use tracing_subscriber::{fmt, EnvFilter};

pub use config::SyncConfig;
pub use encoder::{BlobEncoder, DataUrlEncoder};
pub use error::{EncodeError, SyncError};
pub use events::{AuthorizationState, SessionEvent, SessionEvents, Subscription};
pub use snapshot::{build_snapshot, FileEntry, Snapshot};
pub use synchronizer::CacheSynchronizer;
pub use writer::CycleOutcome;

/// Install a `tracing` subscriber honouring `RUST_LOG`.  Does nothing if a
/// global subscriber is already set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("chatcache_sync=debug,chatcache_store=info,warn"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}
