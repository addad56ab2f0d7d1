//! Snapshot of the chat list and everything it needs to render.
//!
//! [`build_snapshot`] projects the live [`EntityStores`] onto a list of chat
//! ids: the chats themselves, the user or group behind each chat, the sender
//! of each last message, the small photo payloads, and every option.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use chatcache_shared::constants::CACHE_FORMAT_VERSION;
use chatcache_shared::{
    BasicGroup, Chat, ChatId, ChatType, FileId, OptionValue, Supergroup, User,
};
use chatcache_store::EntityStores;

/// One entry of the files record: a file id and its data URL, or `None`
/// when the payload could not be converted.
pub type FileEntry = (FileId, Option<String>);

/// The persisted projection of the chat list.
///
/// Stored as the cache record with `files` empty; the file entries live in
/// their own record and are attached again on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub chats: Vec<Chat>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub basic_groups: Vec<BasicGroup>,
    #[serde(default)]
    pub supergroups: Vec<Supergroup>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub options: Vec<(String, OptionValue)>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            version: CACHE_FORMAT_VERSION,
            chats: Vec::new(),
            users: Vec::new(),
            basic_groups: Vec::new(),
            supergroups: Vec::new(),
            files: Vec::new(),
            options: Vec::new(),
        }
    }
}

/// Build a snapshot of `chat_ids` from the current store contents.
///
/// Chat order is kept and duplicates are not removed.  Ids missing from the
/// chat store are skipped.  The returned map holds the small photo payloads
/// found in memory, keyed by file id; the snapshot's own `files` is empty.
pub fn build_snapshot(
    stores: &EntityStores,
    chat_ids: &[ChatId],
) -> (Snapshot, BTreeMap<FileId, Bytes>) {
    let mut chats = Vec::with_capacity(chat_ids.len());
    let mut users = BTreeMap::new();
    let mut basic_groups = BTreeMap::new();
    let mut supergroups = BTreeMap::new();
    let mut payloads = BTreeMap::new();

    for &chat_id in chat_ids {
        let Some(chat) = stores.chats.get(chat_id) else {
            debug!(%chat_id, "chat not in store, left out of snapshot");
            continue;
        };

        if let Some(photo) = &chat.photo {
            let file_id = photo.small.id;
            if let Some(payload) = stores.files.get_blob(file_id) {
                payloads.insert(file_id, payload);
            }
        }

        match chat.chat_type {
            ChatType::Private { user_id } | ChatType::Secret { user_id, .. } => {
                if let Some(user) = stores.users.get(user_id) {
                    users.insert(user_id, user);
                }
            }
            ChatType::BasicGroup { basic_group_id } => {
                if let Some(group) = stores.basic_groups.get(basic_group_id) {
                    basic_groups.insert(basic_group_id, group);
                }
            }
            ChatType::Supergroup { supergroup_id, .. } => {
                if let Some(group) = stores.supergroups.get(supergroup_id) {
                    supergroups.insert(supergroup_id, group);
                }
            }
        }

        if let Some(sender_id) = chat.last_message.as_ref().and_then(|m| m.sender_user_id) {
            if let Some(user) = stores.users.get(sender_id) {
                users.insert(sender_id, user);
            }
        }

        chats.push(chat);
    }

    let snapshot = Snapshot {
        version: CACHE_FORMAT_VERSION,
        chats,
        users: users.into_values().collect(),
        basic_groups: basic_groups.into_values().collect(),
        supergroups: supergroups.into_values().collect(),
        files: Vec::new(),
        options: stores.options.all(),
    };

    (snapshot, payloads)
}
