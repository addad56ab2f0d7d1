//! Entity records held in the client's in-memory stores and written into
//! the cache snapshot.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be persisted
//! as-is.  Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::types::{BasicGroupId, ChatId, FileId, SupergroupId, UserId};

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// A conversation as seen in the chat list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: ChatId,
    /// Which entity this chat is backed by.
    #[serde(rename = "type")]
    pub chat_type: ChatType,
    pub title: String,
    #[serde(default)]
    pub photo: Option<ChatPhoto>,
    #[serde(default)]
    pub last_message: Option<Message>,
    #[serde(default)]
    pub unread_count: i32,
}

/// The entity behind a chat.  Exactly one variant applies per chat.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ChatType {
    #[serde(rename_all = "camelCase")]
    Private { user_id: UserId },
    #[serde(rename_all = "camelCase")]
    Secret { secret_chat_id: i32, user_id: UserId },
    #[serde(rename_all = "camelCase")]
    BasicGroup { basic_group_id: BasicGroupId },
    #[serde(rename_all = "camelCase")]
    Supergroup {
        supergroup_id: SupergroupId,
        #[serde(default)]
        is_channel: bool,
    },
}

/// Small and big renditions of a chat's photo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatPhoto {
    pub small: File,
    pub big: File,
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// The last message of a chat, as far as the chat list needs it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub chat_id: ChatId,
    /// Absent for messages posted on behalf of a channel.
    #[serde(default)]
    pub sender_user_id: Option<UserId>,
    /// Unix timestamp (seconds).
    pub date: i64,
    #[serde(default)]
    pub text: Option<String>,
}

// ---------------------------------------------------------------------------
// User / groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BasicGroup {
    pub id: BasicGroupId,
    pub member_count: i32,
    /// Set once the group has been upgraded to a supergroup.
    #[serde(default)]
    pub upgraded_to_supergroup_id: Option<SupergroupId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Supergroup {
    pub id: SupergroupId,
    #[serde(default)]
    pub username: Option<String>,
    pub member_count: i32,
    #[serde(default)]
    pub is_channel: bool,
}

// ---------------------------------------------------------------------------
// File
// ---------------------------------------------------------------------------

/// File metadata.  The binary content, when held in memory, lives in the
/// file store next to this record and is never serialized with it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub id: FileId,
    /// Size in bytes, 0 when unknown.
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub local_path: Option<String>,
    #[serde(default)]
    pub remote_id: Option<String>,
}

impl File {
    pub fn new(id: FileId) -> Self {
        Self {
            id,
            size: 0,
            local_path: None,
            remote_id: None,
        }
    }
}
