//! Chat room entity and repository trait.
//!
//! Maps to the `chat_rooms` and `chat_room_members` tables.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Room types matching the `room_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomType {
    /// One-to-one conversation, or a "saved messages" room with a single member
    Private,
    /// Named room with arbitrary membership
    Group,
}

impl RoomType {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PRIVATE" => Some(Self::Private),
            "GROUP" => Some(Self::Group),
            _ => None,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "PRIVATE",
            Self::Group => "GROUP",
        }
    }
}

impl std::fmt::Display for RoomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of a private room: its unordered member set.
///
/// A self-chat is keyed by `(a, a)`, a pair by `(min, max)`, so both callers of
/// a pair resolve to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrivateRoomKey {
    low: i64,
    high: i64,
}

impl PrivateRoomKey {
    pub fn new(a: i64, b: i64) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    pub fn is_self_chat(&self) -> bool {
        self.low == self.high
    }

    /// Member set the key describes.
    pub fn members(&self) -> BTreeSet<i64> {
        BTreeSet::from([self.low, self.high])
    }

    /// Stable storage form, e.g. `"12:34"`.
    pub fn encode(&self) -> String {
        format!("{}:{}", self.low, self.high)
    }
}

/// Represents a chat room.
///
/// Maps to the `chat_rooms` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - name: VARCHAR(255) NOT NULL UNIQUE (across private and group rooms)
/// - room_type: VARCHAR(16) NOT NULL ('PRIVATE' | 'GROUP')
/// - private_key: VARCHAR(64) UNIQUE (set for PRIVATE rooms only)
/// - avatar_url: TEXT NULL
/// - is_public: BOOLEAN NOT NULL DEFAULT FALSE
/// - created_at: TIMESTAMPTZ NOT NULL
///
/// Membership lives in `chat_room_members (room_id, user_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRoom {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub created_at: DateTime<Utc>,
    pub avatar_url: Option<String>,
    /// Group-only; enables invite links and self-service joining
    pub is_public: bool,
    pub members: BTreeSet<i64>,
}

impl ChatRoom {
    /// Build a private room for the given key. The name is derived by the caller.
    pub fn new_private(id: i64, name: String, key: PrivateRoomKey) -> Self {
        Self {
            id,
            name,
            room_type: RoomType::Private,
            created_at: Utc::now(),
            avatar_url: None,
            is_public: false,
            members: key.members(),
        }
    }

    pub fn new_group(
        id: i64,
        name: String,
        members: BTreeSet<i64>,
        avatar_url: Option<String>,
        is_public: bool,
    ) -> Self {
        Self {
            id,
            name,
            room_type: RoomType::Group,
            created_at: Utc::now(),
            avatar_url,
            is_public,
            members,
        }
    }

    pub fn is_private(&self) -> bool {
        self.room_type == RoomType::Private
    }

    pub fn is_group(&self) -> bool {
        self.room_type == RoomType::Group
    }

    /// Dedup key of a private room; `None` for groups.
    pub fn private_key(&self) -> Option<PrivateRoomKey> {
        if !self.is_private() {
            return None;
        }
        let mut iter = self.members.iter().copied();
        match (iter.next(), iter.next(), iter.next()) {
            (Some(a), None, None) => Some(PrivateRoomKey::new(a, a)),
            (Some(a), Some(b), None) => Some(PrivateRoomKey::new(a, b)),
            _ => None,
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// Field changes applied by a group update.
#[derive(Debug, Clone, Default)]
pub struct RoomChanges {
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub is_public: Option<bool>,
}

impl RoomChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.avatar_url.is_none() && self.is_public.is_none()
    }
}

/// Repository trait for chat room data access.
///
/// Implementations must enforce, atomically with the write:
/// - global name uniqueness (`Conflict` on violation)
/// - at most one PRIVATE room per `PrivateRoomKey`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Find a room by id.
    async fn find_by_id(&self, id: i64) -> Result<Option<ChatRoom>, AppError>;

    /// All rooms, oldest first.
    async fn find_all(&self) -> Result<Vec<ChatRoom>, AppError>;

    /// Find the private room for a member set.
    async fn find_private(&self, key: PrivateRoomKey) -> Result<Option<ChatRoom>, AppError>;

    /// Check whether any room (private or group) already uses `name`.
    async fn name_exists(&self, name: &str) -> Result<bool, AppError>;

    /// Insert a group room. Fails `Conflict` if the name is taken.
    async fn create_group(&self, room: &ChatRoom) -> Result<ChatRoom, AppError>;

    /// Insert a private room unless one already exists for its key, in which
    /// case the existing room is returned. Fails `Conflict` only on a name clash.
    async fn create_private_or_get(&self, room: &ChatRoom) -> Result<ChatRoom, AppError>;

    /// Apply field changes. Returns `None` if the room does not exist.
    async fn update(&self, id: i64, changes: &RoomChanges) -> Result<Option<ChatRoom>, AppError>;

    /// Add members (existing members are ignored). Returns `None` if the room does not exist.
    async fn add_members(&self, id: i64, user_ids: &[i64]) -> Result<Option<ChatRoom>, AppError>;

    /// Delete a room together with its messages, reactions and read receipts.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_key_is_order_independent() {
        assert_eq!(PrivateRoomKey::new(7, 3), PrivateRoomKey::new(3, 7));
        assert_eq!(PrivateRoomKey::new(7, 3).encode(), "3:7");
    }

    #[test]
    fn test_self_chat_key_has_single_member() {
        let key = PrivateRoomKey::new(5, 5);
        assert!(key.is_self_chat());
        assert_eq!(key.members().len(), 1);
    }

    #[test]
    fn test_private_key_roundtrip_through_room() {
        let key = PrivateRoomKey::new(1, 2);
        let room = ChatRoom::new_private(10, "a_b".into(), key);
        assert_eq!(room.private_key(), Some(key));

        let group = ChatRoom::new_group(11, "team".into(), BTreeSet::from([1, 2]), None, false);
        assert_eq!(group.private_key(), None);
    }

    #[test]
    fn test_room_type_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&RoomType::Private).unwrap(), "\"PRIVATE\"");
        assert_eq!(RoomType::from_str("group"), Some(RoomType::Group));
        assert_eq!(RoomType::from_str("channel"), None);
    }
}
