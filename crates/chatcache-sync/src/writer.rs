//! Debounced persistence of the chat list.
//!
//! `save_chats` only records the request and (re)arms a timer.  When the quiet
//! period elapses the pending chat ids are taken out of their slot and one
//! save cycle runs with them:
//!
//! 1. build the snapshot from the live stores;
//! 2. persist the cache record (without file payloads);
//! 3. convert every payload to a URL concurrently, a failure giving `None`;
//! 4. persist the files record once all conversions have settled.
//!
//! The cycle is spawned on its own task, so re-arming the timer never cancels
//! a cycle that has already started.

use std::collections::BTreeMap;

use bytes::Bytes;
use futures::future::join_all;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use chatcache_shared::constants::{CACHE_KEY, FILES_KEY};
use chatcache_shared::{ChatId, FileId};
use chatcache_store::BlobStorage;

use crate::encoder::BlobEncoder;
use crate::error::SyncError;
use crate::snapshot::{build_snapshot, FileEntry, Snapshot};
use crate::synchronizer::{CacheSynchronizer, CycleStamp};

/// How a save cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Both records were written.
    Saved,
    /// A purge happened while the cycle ran; it stopped writing.
    Abandoned,
    /// A storage or serialization error stopped the cycle.
    Failed,
}

impl CacheSynchronizer {
    /// Request a save of `chat_ids` once no further request arrives for the
    /// configured quiet period.  Later calls replace earlier ones.
    ///
    /// Outside a tokio runtime the request is only recorded; `flush` picks it
    /// up later.
    pub fn save_chats(&self, chat_ids: Vec<ChatId>) {
        let delay = self.inner.config.save_debounce;
        let mut state = self.lock_state();

        debug!(count = chat_ids.len(), "save requested");
        state.pending = Some(chat_ids);
        state.cancel_timer();

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "no tokio runtime, save deferred until flush");
                return;
            }
        };

        state.timer_generation += 1;
        let generation = state.timer_generation;
        let this = self.clone();
        let timer = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            this.fire(generation);
        });
        state.timer = Some((generation, timer));
    }

    /// Run the pending request now, if there is one, and wait for it.
    /// Meant for shutdown, where the debounce timer would never fire.
    pub async fn flush(&self) -> Option<CycleOutcome> {
        let (chat_ids, stamp) = {
            let mut state = self.lock_state();
            state.cancel_timer();
            let chat_ids = state.pending.take()?;
            (chat_ids, state.stamp())
        };
        Some(self.run_cycle(chat_ids, stamp).await)
    }

    /// Save `chat_ids` immediately, bypassing the debounce, and wait for the
    /// cycle.  A pending request is left untouched.
    pub async fn save_now(&self, chat_ids: Vec<ChatId>) -> CycleOutcome {
        let stamp = self.stamp();
        self.run_cycle(chat_ids, stamp).await
    }

    /// Timer expiry: swap the pending request out and start its cycle.
    /// A timer that was replaced or cancelled after waking does nothing.
    fn fire(&self, generation: u64) {
        let (chat_ids, stamp) = {
            let mut state = self.lock_state();
            if !matches!(state.timer, Some((armed, _)) if armed == generation) {
                debug!(generation, "stale save timer ignored");
                return;
            }
            state.timer = None;
            match state.pending.take() {
                Some(chat_ids) => (chat_ids, state.stamp()),
                None => return,
            }
        };

        let this = self.clone();
        tokio::spawn(async move {
            this.run_cycle(chat_ids, stamp).await;
        });
    }

    async fn run_cycle(&self, chat_ids: Vec<ChatId>, stamp: CycleStamp) -> CycleOutcome {
        let outcome = self.save_cycle(&chat_ids, stamp).await;
        match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "cache save failed");
                self.finish_cycle();
                CycleOutcome::Failed
            }
        }
    }

    async fn save_cycle(
        &self,
        chat_ids: &[ChatId],
        stamp: CycleStamp,
    ) -> Result<CycleOutcome, SyncError> {
        let (mut snapshot, payloads) = build_snapshot(&self.inner.stores, chat_ids);
        let cache_bytes = serde_json::to_vec(&snapshot)?;

        if !self.is_current(stamp) {
            return Ok(self.abandon("before cache record"));
        }
        self.inner.storage.save(CACHE_KEY, cache_bytes).await?;

        // A wipe may have landed while the write was in flight.  Take the
        // record back out rather than leave it behind the wipe.
        if !self.is_current(stamp) {
            if let Err(e) = self.inner.storage.remove(CACHE_KEY).await {
                warn!(error = %e, "failed to roll back cache record");
            }
            return Ok(self.abandon("after cache record"));
        }

        let files = self.encode_payloads(payloads).await;
        let files_bytes = serde_json::to_vec(&files)?;

        if !self.is_current(stamp) {
            return Ok(self.abandon("before files record"));
        }
        self.inner.storage.save(FILES_KEY, files_bytes).await?;

        let converted = files.iter().filter(|(_, url)| url.is_some()).count();
        info!(
            chats = snapshot.chats.len(),
            users = snapshot.users.len(),
            files = files.len(),
            converted,
            "cache saved"
        );

        snapshot.files = files;
        self.keep_snapshot(snapshot, stamp);
        self.finish_cycle();
        Ok(CycleOutcome::Saved)
    }

    async fn encode_payloads(&self, payloads: BTreeMap<FileId, Bytes>) -> Vec<FileEntry> {
        let encoder = &self.inner.encoder;
        let conversions = payloads.into_iter().map(|(file_id, payload)| async move {
            match encoder.encode(file_id, payload).await {
                Ok(url) => (file_id, Some(url)),
                Err(e) => {
                    warn!(%file_id, error = %e, "file payload conversion failed");
                    (file_id, None)
                }
            }
        });
        join_all(conversions).await
    }

    /// Only a wipe stops a cycle; a reset lets it finish its writes.
    fn is_current(&self, stamp: CycleStamp) -> bool {
        self.epoch() == stamp.epoch
    }

    fn keep_snapshot(&self, snapshot: Snapshot, stamp: CycleStamp) {
        let mut state = self.lock_state();
        if state.stamp() == stamp {
            state.cache = Some(snapshot);
        }
    }

    fn abandon(&self, stage: &'static str) -> CycleOutcome {
        debug!(stage, "session changed during save, cycle abandoned");
        self.finish_cycle();
        CycleOutcome::Abandoned
    }

    fn finish_cycle(&self) {
        self.inner.cycles.send_modify(|count| *count += 1);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::config::SyncConfig;
    use chatcache_shared::{Chat, ChatType, UserId};
    use chatcache_store::{EntityStores, MemoryBlobStorage};

    fn setup() -> (CacheSynchronizer, MemoryBlobStorage) {
        let storage = MemoryBlobStorage::new();
        let stores = EntityStores::shared();
        for id in 1..=3 {
            stores.chats.set(Chat {
                id: ChatId(id),
                chat_type: ChatType::Private { user_id: UserId(id) },
                title: format!("chat{id}"),
                photo: None,
                last_message: None,
                unread_count: 0,
            });
        }
        let sync = CacheSynchronizer::new(Arc::new(storage.clone()), stores, SyncConfig::default());
        (sync, storage)
    }

    async fn saved_chat_ids(storage: &MemoryBlobStorage) -> Vec<ChatId> {
        let bytes = storage.load(CACHE_KEY).await.unwrap();
        let snapshot: Snapshot = serde_json::from_slice(&bytes).unwrap();
        snapshot.chats.iter().map(|c| c.id).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_saved_before_the_quiet_period() {
        let (sync, storage) = setup();
        sync.save_chats(vec![ChatId(1)]);

        tokio::time::sleep(Duration::from_millis(1_999)).await;
        assert_eq!(storage.save_count(CACHE_KEY), 0);
        assert_eq!(sync.pending_chat_ids(), Some(vec![ChatId(1)]));
    }

    #[tokio::test(start_paused = true)]
    async fn every_call_restarts_the_quiet_period() {
        let (sync, storage) = setup();
        let mut cycles = sync.completed_cycles();

        sync.save_chats(vec![ChatId(1)]);
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        sync.save_chats(vec![ChatId(1), ChatId(2)]);
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(storage.save_count(CACHE_KEY), 0);

        cycles.changed().await.unwrap();
        assert_eq!(storage.save_count(CACHE_KEY), 1);
        assert_eq!(saved_chat_ids(&storage).await, vec![ChatId(1), ChatId(2)]);
        assert!(sync.pending_chat_ids().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn replaced_timer_waking_late_leaves_the_new_request_alone() {
        let (sync, storage) = setup();
        let mut cycles = sync.completed_cycles();

        sync.save_chats(vec![ChatId(1)]);
        sync.save_chats(vec![ChatId(2)]);

        // First timer wakes after it was replaced.
        sync.fire(1);
        assert_eq!(sync.pending_chat_ids(), Some(vec![ChatId(2)]));
        assert_eq!(storage.save_count(CACHE_KEY), 0);

        cycles.changed().await.unwrap();
        assert_eq!(storage.save_count(CACHE_KEY), 1);
        assert_eq!(saved_chat_ids(&storage).await, vec![ChatId(2)]);
    }

    #[test]
    fn request_outside_a_runtime_waits_for_flush() {
        let (sync, storage) = setup();
        sync.save_chats(vec![ChatId(2)]);
        assert_eq!(sync.pending_chat_ids(), Some(vec![ChatId(2)]));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        assert_eq!(runtime.block_on(sync.flush()), Some(CycleOutcome::Saved));
        assert!(storage.contains(CACHE_KEY));
    }

    #[tokio::test]
    async fn flush_runs_pending_request_immediately() {
        let (sync, storage) = setup();
        sync.save_chats(vec![ChatId(3)]);

        assert_eq!(sync.flush().await, Some(CycleOutcome::Saved));
        assert_eq!(saved_chat_ids(&storage).await, vec![ChatId(3)]);
        assert!(storage.contains(FILES_KEY));

        assert_eq!(sync.flush().await, None);
    }

    #[tokio::test]
    async fn save_now_keeps_the_snapshot_in_memory() {
        let (sync, _storage) = setup();
        assert_eq!(sync.save_now(vec![ChatId(2)]).await, CycleOutcome::Saved);

        let cached = sync.cached_snapshot().unwrap();
        assert_eq!(cached.chats.len(), 1);
    }

    #[tokio::test]
    async fn storage_failure_fails_the_cycle() {
        let (sync, storage) = setup();
        storage.set_failing(true);

        assert_eq!(sync.save_now(vec![ChatId(1)]).await, CycleOutcome::Failed);
        assert!(sync.cached_snapshot().is_none());
        assert_eq!(*sync.completed_cycles().borrow(), 1);
    }
}
