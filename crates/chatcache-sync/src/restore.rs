//! Startup restore and release of restored file URLs.

use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use chatcache_shared::constants::{CACHE_FORMAT_VERSION, CACHE_KEY, FILES_KEY};
use chatcache_shared::Chat;
use chatcache_store::{BlobStorage, StoreError};

use crate::error::SyncError;
use crate::snapshot::{FileEntry, Snapshot};
use crate::synchronizer::CacheSynchronizer;

impl CacheSynchronizer {
    /// Load the persisted snapshot and replay it into the entity stores.
    ///
    /// Returns the cached chat list in saved order, or `None` on a cache miss
    /// (no cache record, unreadable record, or a record from another format
    /// version).  Storage failures count as a miss; nothing is replayed then.
    pub async fn get_chats(&self) -> Option<Vec<Chat>> {
        let (cache, files) = tokio::join!(
            self.load_record::<Snapshot>(CACHE_KEY),
            self.load_record::<Vec<FileEntry>>(FILES_KEY),
        );

        let mut snapshot = cache?;
        if snapshot.version != CACHE_FORMAT_VERSION {
            warn!(
                found = snapshot.version,
                expected = CACHE_FORMAT_VERSION,
                "cache record has another format version, ignored"
            );
            return None;
        }
        snapshot.files = files.unwrap_or_default();

        self.replay(&snapshot);
        info!(
            chats = snapshot.chats.len(),
            files = snapshot.files.len(),
            "cache restored"
        );

        let chats = snapshot.chats.clone();
        self.lock_state().cache = Some(snapshot);
        Some(chats)
    }

    /// Release the file URLs registered from the held snapshot.  Persisted
    /// records and the held snapshot itself are left alone.
    pub fn clear(&self) {
        let file_ids: Vec<_> = match &self.lock_state().cache {
            Some(cache) => cache.files.iter().map(|(file_id, _)| *file_id).collect(),
            None => return,
        };

        let files = &self.inner.stores.files;
        let released = file_ids
            .into_iter()
            .filter(|file_id| files.delete_data_url(*file_id))
            .count();
        debug!(released, "released cached file URLs");
    }

    fn replay(&self, snapshot: &Snapshot) {
        let stores = &self.inner.stores;

        for (file_id, url) in &snapshot.files {
            if let Some(url) = url {
                stores.files.set_data_url(*file_id, url.clone());
            }
        }
        for user in &snapshot.users {
            stores.users.set(user.clone());
        }
        for group in &snapshot.basic_groups {
            stores.basic_groups.set(group.clone());
        }
        for group in &snapshot.supergroups {
            stores.supergroups.set(group.clone());
        }
        for chat in &snapshot.chats {
            stores.chats.set(chat.clone());
            if let Some(photo) = &chat.photo {
                stores.files.set(photo.small.clone());
                stores.files.set(photo.big.clone());
            }
        }
        for (name, value) in &snapshot.options {
            stores.options.set(name.clone(), value.clone());
        }
    }

    async fn load_record<T: DeserializeOwned>(&self, key: &'static str) -> Option<T> {
        match self.read_record(key).await {
            Ok(value) => Some(value),
            Err(SyncError::Store(StoreError::NotFound)) => {
                debug!(key, "no cached record");
                None
            }
            Err(e) => {
                warn!(key, error = %e, "cached record unavailable");
                None
            }
        }
    }

    async fn read_record<T: DeserializeOwned>(&self, key: &str) -> Result<T, SyncError> {
        let bytes = self.inner.storage.load(key).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::SyncConfig;
    use chatcache_shared::{
        BasicGroup, BasicGroupId, ChatId, ChatPhoto, ChatType, File, FileId, OptionValue,
    };
    use chatcache_store::{EntityStores, MemoryBlobStorage};

    fn synchronizer(storage: &MemoryBlobStorage) -> CacheSynchronizer {
        CacheSynchronizer::new(
            Arc::new(storage.clone()),
            EntityStores::shared(),
            SyncConfig::default(),
        )
    }

    fn group_chat() -> Chat {
        Chat {
            id: ChatId(-10),
            chat_type: ChatType::BasicGroup {
                basic_group_id: BasicGroupId(10),
            },
            title: "team".into(),
            photo: Some(ChatPhoto {
                small: File::new(FileId(1)),
                big: File::new(FileId(2)),
            }),
            last_message: None,
            unread_count: 3,
        }
    }

    async fn seed(storage: &MemoryBlobStorage, files: &str) {
        let snapshot = Snapshot {
            chats: vec![group_chat()],
            basic_groups: vec![BasicGroup {
                id: BasicGroupId(10),
                member_count: 2,
                upgraded_to_supergroup_id: None,
            }],
            options: vec![("my_id".into(), OptionValue::Integer(99))],
            ..Snapshot::default()
        };
        storage
            .save(CACHE_KEY, serde_json::to_vec(&snapshot).unwrap())
            .await
            .unwrap();
        storage.save(FILES_KEY, files.as_bytes().to_vec()).await.unwrap();
    }

    #[tokio::test]
    async fn replays_every_entity_kind() {
        let storage = MemoryBlobStorage::new();
        seed(&storage, r#"[[1, "data:image/png;base64,AA=="], [5, null]]"#).await;
        let sync = synchronizer(&storage);

        let chats = sync.get_chats().await.unwrap();
        assert_eq!(chats, vec![group_chat()]);

        let stores = sync.stores();
        assert!(stores.chats.get(ChatId(-10)).is_some());
        assert!(stores.basic_groups.get(BasicGroupId(10)).is_some());
        assert_eq!(stores.options.get("my_id"), Some(OptionValue::Integer(99)));
        assert!(stores.files.get(FileId(1)).is_some());
        assert!(stores.files.get(FileId(2)).is_some());
        assert_eq!(
            stores.files.get_data_url(FileId(1)).as_deref(),
            Some("data:image/png;base64,AA==")
        );
        assert!(stores.files.get_data_url(FileId(5)).is_none());
    }

    #[tokio::test]
    async fn unreadable_files_record_still_restores_chats() {
        let storage = MemoryBlobStorage::new();
        seed(&storage, "not json").await;
        let sync = synchronizer(&storage);

        assert_eq!(sync.get_chats().await.unwrap().len(), 1);
        assert!(sync.cached_snapshot().unwrap().files.is_empty());
    }

    #[tokio::test]
    async fn foreign_version_is_a_miss() {
        let storage = MemoryBlobStorage::new();
        storage
            .save(CACHE_KEY, br#"{"version": 0, "chats": []}"#.to_vec())
            .await
            .unwrap();
        let sync = synchronizer(&storage);

        assert!(sync.get_chats().await.is_none());
        assert!(sync.stores().is_empty());
    }

    #[tokio::test]
    async fn failing_storage_is_a_miss() {
        let storage = MemoryBlobStorage::new();
        seed(&storage, "[]").await;
        storage.set_failing(true);
        let sync = synchronizer(&storage);

        assert!(sync.get_chats().await.is_none());
        assert!(sync.stores().is_empty());
    }

    #[tokio::test]
    async fn clear_releases_only_restored_urls() {
        let storage = MemoryBlobStorage::new();
        seed(&storage, r#"[[1, "data:image/png;base64,AA=="]]"#).await;
        let sync = synchronizer(&storage);

        sync.clear();
        assert!(sync.cached_snapshot().is_none());

        sync.get_chats().await.unwrap();
        sync.stores()
            .files
            .set_data_url(FileId(7), "blob:live".into());

        sync.clear();
        assert!(sync.stores().files.get_data_url(FileId(1)).is_none());
        assert!(sync.stores().files.get_data_url(FileId(7)).is_some());
        assert!(sync.cached_snapshot().is_some());
        assert!(storage.contains(CACHE_KEY));
    }
}
