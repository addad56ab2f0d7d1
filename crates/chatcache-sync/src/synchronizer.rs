//! The cache synchronizer handle and its shared state.
//!
//! [`CacheSynchronizer`] is a cheap `Clone` handle.  Its operations are split
//! by concern across modules:
//!
//! - [`crate::writer`]: `save_chats`, `flush`, `save_now` and the save cycle;
//! - [`crate::restore`]: `get_chats` and `clear`;
//! - [`crate::lifecycle`]: `handle_event` and `attach`.
//!
//! State is guarded by a `std::sync::Mutex` that is never held across an
//! `.await`.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use chatcache_shared::ChatId;
use chatcache_store::{BlobStorage, Database, EntityStores, SqliteBlobStorage};

use crate::config::SyncConfig;
use crate::encoder::{BlobEncoder, DataUrlEncoder};
use crate::error::SyncError;
use crate::snapshot::Snapshot;

#[derive(Default)]
pub(crate) struct SyncState {
    /// Chat ids of the latest `save_chats` call not yet picked up by a cycle.
    pub(crate) pending: Option<Vec<ChatId>>,
    /// Last snapshot loaded or saved in this session.
    pub(crate) cache: Option<Snapshot>,
    /// Advanced on every purge.  Cycles started in an older epoch must not
    /// persist.
    pub(crate) epoch: u64,
    /// Advanced on every reset and purge.  A cycle started in an older
    /// session still writes, but its snapshot is not kept in memory.
    pub(crate) session: u64,
    /// Armed debounce timer, if any, with the generation it was armed in.
    pub(crate) timer: Option<(u64, JoinHandle<()>)>,
    pub(crate) timer_generation: u64,
}

impl SyncState {
    pub(crate) fn stamp(&self) -> CycleStamp {
        CycleStamp {
            epoch: self.epoch,
            session: self.session,
        }
    }

    pub(crate) fn cancel_timer(&mut self) {
        if let Some((_, timer)) = self.timer.take() {
            timer.abort();
        }
    }
}

/// Epoch and session a save cycle was started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CycleStamp {
    pub(crate) epoch: u64,
    pub(crate) session: u64,
}

pub(crate) struct Inner {
    pub(crate) storage: Arc<dyn BlobStorage>,
    pub(crate) stores: Arc<EntityStores>,
    pub(crate) encoder: Arc<dyn BlobEncoder>,
    pub(crate) config: SyncConfig,
    pub(crate) state: Mutex<SyncState>,
    pub(crate) cycles: watch::Sender<u64>,
}

/// Keeps a persisted snapshot of the chat list in step with the live stores
/// and the session lifecycle.
#[derive(Clone)]
pub struct CacheSynchronizer {
    pub(crate) inner: Arc<Inner>,
}

impl CacheSynchronizer {
    pub fn new(
        storage: Arc<dyn BlobStorage>,
        stores: Arc<EntityStores>,
        config: SyncConfig,
    ) -> Self {
        let encoder = Arc::new(DataUrlEncoder::new(config.max_file_size));
        Self::with_encoder(storage, stores, encoder, config)
    }

    pub fn with_encoder(
        storage: Arc<dyn BlobStorage>,
        stores: Arc<EntityStores>,
        encoder: Arc<dyn BlobEncoder>,
        config: SyncConfig,
    ) -> Self {
        let (cycles, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                storage,
                stores,
                encoder,
                config,
                state: Mutex::new(SyncState::default()),
                cycles,
            }),
        }
    }

    /// Open the SQLite cache at `config.db_path` (or the platform cache
    /// directory) and build a synchronizer on top of it.
    pub fn open(stores: Arc<EntityStores>, config: SyncConfig) -> Result<Self, SyncError> {
        let db = match &config.db_path {
            Some(path) => Database::open_at(path)?,
            None => Database::new()?,
        };
        let storage = Arc::new(SqliteBlobStorage::new(db));
        Ok(Self::new(storage, stores, config))
    }

    pub fn stores(&self) -> &Arc<EntityStores> {
        &self.inner.stores
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Counter of finished save cycles, whether they saved, failed or were
    /// abandoned.  Await `changed()` on it to know a cycle is over.
    pub fn completed_cycles(&self) -> watch::Receiver<u64> {
        self.inner.cycles.subscribe()
    }

    /// The snapshot currently held in memory, if any.
    pub fn cached_snapshot(&self) -> Option<Snapshot> {
        self.lock_state().cache.clone()
    }

    /// Chat ids waiting for the debounce timer, if any.
    pub fn pending_chat_ids(&self) -> Option<Vec<ChatId>> {
        self.lock_state().pending.clone()
    }

    pub(crate) fn lock_state(&self) -> MutexGuard<'_, SyncState> {
        // The state stays consistent between statements, so a poisoned lock
        // is still safe to use.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.lock_state().epoch
    }

    pub(crate) fn stamp(&self) -> CycleStamp {
        self.lock_state().stamp()
    }
}
