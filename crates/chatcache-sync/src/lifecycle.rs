//! Reactions to the session lifecycle.
//!
//! | event                                   | reaction                         |
//! |-----------------------------------------|----------------------------------|
//! | `Closed`                                | forget pending save and snapshot |
//! | `LoggingOut`, `Wait{PhoneNumber,Code,Password,Registration}` | wipe both records |
//! | `DialogsReady`                          | [`CacheSynchronizer::clear`]     |
//!
//! Reset and wipe both cancel an armed save.  Reset never touches storage: a
//! cycle already running completes its writes, but its snapshot is not kept.
//! Wipe also advances the epoch, so a cycle that started before it never
//! writes after it.

use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use chatcache_shared::constants::{CACHE_KEY, FILES_KEY};
use chatcache_store::BlobStorage;

use crate::events::{AuthorizationState, SessionEvent, SessionEvents, Subscription};
use crate::synchronizer::CacheSynchronizer;

impl CacheSynchronizer {
    /// Listen to `events` until the returned subscription is dropped or the
    /// source goes away.
    pub fn attach(&self, events: &SessionEvents) -> Subscription {
        let mut rx = events.subscribe();
        let this = self.clone();

        let task = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => this.handle_event(&event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "cache fell behind session events");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("session event listener stopped");
        });

        Subscription::new(task)
    }

    pub async fn handle_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::AuthorizationState(AuthorizationState::Closed) => self.reset(),
            SessionEvent::AuthorizationState(state) if state.invalidates_cache() => {
                self.purge(*state).await
            }
            SessionEvent::AuthorizationState(_) => {}
            SessionEvent::DialogsReady => self.clear(),
        }
    }

    /// Session closed: drop in-memory state, leave storage as it is.
    fn reset(&self) {
        let mut state = self.lock_state();
        state.cancel_timer();
        state.pending = None;
        state.cache = None;
        state.session += 1;
        info!(session = state.session, "cache state reset");
    }

    /// Account gone or being replaced: wipe both persisted records.
    /// Failures only leave stale data behind, so they are logged and dropped.
    async fn purge(&self, reason: AuthorizationState) {
        {
            let mut state = self.lock_state();
            state.cancel_timer();
            state.pending = None;
            state.epoch += 1;
            state.session += 1;
        }

        let storage = &self.inner.storage;
        let (cache, files) = tokio::join!(storage.remove(CACHE_KEY), storage.remove(FILES_KEY));
        for (key, result) in [(CACHE_KEY, cache), (FILES_KEY, files)] {
            if let Err(e) = result {
                warn!(key, error = %e, "failed to remove cached record");
            }
        }
        info!(?reason, "cache purged");
    }
}
