//! In-memory entity stores.
//!
//! These are the client's live, normalized object graph: one keyed map per
//! entity type.  The session writes into them as updates arrive, the cache
//! layer reads them when building a snapshot and writes them when restoring.
//! All stores are cheap to share through [`EntityStores`] and tolerate
//! concurrent readers and writers.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use bytes::Bytes;

use chatcache_shared::{
    BasicGroup, BasicGroupId, Chat, ChatId, File, FileId, OptionValue, Supergroup, SupergroupId,
    User, UserId,
};

/// A record that can live in an [`EntityStore`].
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Copy + Eq + Hash + Send + Sync + 'static;

    fn entity_id(&self) -> Self::Id;
}

impl Entity for Chat {
    type Id = ChatId;

    fn entity_id(&self) -> ChatId {
        self.id
    }
}

impl Entity for User {
    type Id = UserId;

    fn entity_id(&self) -> UserId {
        self.id
    }
}

impl Entity for BasicGroup {
    type Id = BasicGroupId;

    fn entity_id(&self) -> BasicGroupId {
        self.id
    }
}

impl Entity for Supergroup {
    type Id = SupergroupId;

    fn entity_id(&self) -> SupergroupId {
        self.id
    }
}

impl Entity for File {
    type Id = FileId;

    fn entity_id(&self) -> FileId {
        self.id
    }
}

// ---------------------------------------------------------------------------
// EntityStore
// ---------------------------------------------------------------------------

/// Keyed map of one entity type.  `set` is an upsert.
pub struct EntityStore<T: Entity> {
    items: RwLock<HashMap<T::Id, T>>,
}

impl<T: Entity> EntityStore<T> {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }

    pub fn set(&self, item: T) {
        // A poisoned lock still holds a usable map; keep serving it.
        let mut items = self.items.write().unwrap_or_else(|e| e.into_inner());
        items.insert(item.entity_id(), item);
    }

    pub fn get(&self, id: T::Id) -> Option<T> {
        let items = self.items.read().unwrap_or_else(|e| e.into_inner());
        items.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Entity> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FileMaps {
    meta: HashMap<FileId, File>,
    blobs: HashMap<FileId, Bytes>,
    urls: HashMap<FileId, String>,
}

/// File metadata plus two side maps: in-memory payloads (downloaded content)
/// and URLs registered for display.
#[derive(Default)]
pub struct FileStore {
    maps: RwLock<FileMaps>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, file: File) {
        self.write().meta.insert(file.id, file);
    }

    pub fn get(&self, id: FileId) -> Option<File> {
        self.read().meta.get(&id).cloned()
    }

    pub fn set_blob(&self, id: FileId, payload: Bytes) {
        self.write().blobs.insert(id, payload);
    }

    pub fn get_blob(&self, id: FileId) -> Option<Bytes> {
        self.read().blobs.get(&id).cloned()
    }

    pub fn set_data_url(&self, id: FileId, url: String) {
        self.write().urls.insert(id, url);
    }

    pub fn get_data_url(&self, id: FileId) -> Option<String> {
        self.read().urls.get(&id).cloned()
    }

    /// Drop the URL registered for `id`, releasing the memory it holds.
    pub fn delete_data_url(&self, id: FileId) -> bool {
        self.write().urls.remove(&id).is_some()
    }

    pub fn data_url_count(&self) -> usize {
        self.read().urls.len()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, FileMaps> {
        self.maps.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, FileMaps> {
        self.maps.write().unwrap_or_else(|e| e.into_inner())
    }
}

// ---------------------------------------------------------------------------
// OptionStore
// ---------------------------------------------------------------------------

/// Global client options, keyed by name.
#[derive(Default)]
pub struct OptionStore {
    options: RwLock<BTreeMap<String, OptionValue>>,
}

impl OptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, name: impl Into<String>, value: OptionValue) {
        let mut options = self.options.write().unwrap_or_else(|e| e.into_inner());
        options.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<OptionValue> {
        let options = self.options.read().unwrap_or_else(|e| e.into_inner());
        options.get(name).cloned()
    }

    /// Every option, ordered by name.
    pub fn all(&self) -> Vec<(String, OptionValue)> {
        let options = self.options.read().unwrap_or_else(|e| e.into_inner());
        options
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// EntityStores
// ---------------------------------------------------------------------------

/// All entity stores of one client session.
#[derive(Default)]
pub struct EntityStores {
    pub users: EntityStore<User>,
    pub basic_groups: EntityStore<BasicGroup>,
    pub supergroups: EntityStore<Supergroup>,
    pub chats: EntityStore<Chat>,
    pub files: FileStore,
    pub options: OptionStore,
}

impl EntityStores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// `true` if no store holds anything.  Restores use this in tests to prove
    /// nothing was replayed.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
            && self.basic_groups.is_empty()
            && self.supergroups.is_empty()
            && self.chats.is_empty()
            && self.files.read().meta.is_empty()
            && self.files.data_url_count() == 0
            && self.options.all().is_empty()
    }
}
