//! Message entity and repository trait.
//!
//! Maps to the `messages` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::reaction::Reactions;
use crate::shared::error::AppError;

/// Maximum message content length in characters.
pub const MAX_CONTENT_LENGTH: usize = 4000;

/// Message types matching the `message_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    /// Plain text message
    #[default]
    Text,
    Image,
    Video,
    Audio,
    /// Any other attachment
    File,
}

impl MessageType {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "TEXT" => Some(Self::Text),
            "IMAGE" => Some(Self::Image),
            "VIDEO" => Some(Self::Video),
            "AUDIO" => Some(Self::Audio),
            "FILE" => Some(Self::File),
            _ => None,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Image => "IMAGE",
            Self::Video => "VIDEO",
            Self::Audio => "AUDIO",
            Self::File => "FILE",
        }
    }

    /// Whether messages of this type carry a file URL.
    pub fn has_attachment(&self) -> bool {
        !matches!(self, Self::Text)
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents a message in a room.
///
/// Maps to the `messages` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - room_id: BIGINT NOT NULL REFERENCES chat_rooms(id) ON DELETE CASCADE
/// - sender_id: BIGINT NOT NULL
/// - content: TEXT NOT NULL (text, or the original file name for uploads)
/// - message_type: VARCHAR(16) NOT NULL DEFAULT 'TEXT'
/// - file_url: TEXT NULL
/// - deleted_for_all: BOOLEAN NOT NULL DEFAULT FALSE
/// - edited_at: TIMESTAMPTZ NULL
/// - created_at: TIMESTAMPTZ NOT NULL
///
/// Reactions are loaded from `message_reactions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub room_id: i64,
    pub sender_id: i64,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set only by the sender; strictly increases with every edit
    pub edited_at: Option<DateTime<Utc>>,
    /// Tombstone flag: the row is kept and clients hide it
    pub deleted_for_all: bool,
    #[serde(default)]
    pub reactions: Reactions,
}

impl Message {
    pub fn new(
        id: i64,
        room_id: i64,
        sender_id: i64,
        content: String,
        message_type: MessageType,
        file_url: Option<String>,
    ) -> Self {
        Self {
            id,
            room_id,
            sender_id,
            content,
            message_type,
            file_url,
            created_at: Utc::now(),
            edited_at: None,
            deleted_for_all: false,
            reactions: Reactions::new(),
        }
    }

    pub fn is_edited(&self) -> bool {
        self.edited_at.is_some()
    }

    pub fn is_sent_by(&self, user_id: i64) -> bool {
        self.sender_id == user_id
    }

    /// Timestamp for the next edit: `now`, bumped past the previous edit if the
    /// clock has not moved forward.
    pub fn next_edit_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.edited_at {
            Some(previous) if previous >= now => previous + Duration::microseconds(1),
            _ => now,
        }
    }
}

/// Outcome of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    /// Row kept with `deleted_for_all = true`
    Tombstoned,
    /// Row physically removed
    Removed,
}

/// Repository trait for Message data access operations.
///
/// Reaction mutations must be atomic per message: concurrent adds and
/// removes on the same message never lose updates.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Find a message (with reactions) by id.
    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, AppError>;

    /// Messages in a room ordered by `created_at` ascending, then id.
    async fn find_by_room(&self, room_id: i64) -> Result<Vec<Message>, AppError>;

    /// Insert a new message.
    async fn create(&self, message: &Message) -> Result<Message, AppError>;

    /// Replace content and set `edited_at`. Returns `None` if the message is gone.
    async fn update_content(
        &self,
        id: i64,
        content: &str,
        edited_at: DateTime<Utc>,
    ) -> Result<Option<Message>, AppError>;

    /// Set the tombstone flag. Returns `None` if the message is gone.
    async fn mark_deleted_for_all(&self, id: i64) -> Result<Option<Message>, AppError>;

    /// Physically remove a message with its reactions and read receipts.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Add a reaction and return the resulting map. `None` if the message is gone.
    async fn add_reaction(
        &self,
        id: i64,
        user_id: i64,
        emoji: &str,
    ) -> Result<Option<Reactions>, AppError>;

    /// Remove a reaction and return the resulting map. `None` if the message is gone.
    async fn remove_reaction(
        &self,
        id: i64,
        user_id: i64,
        emoji: &str,
    ) -> Result<Option<Reactions>, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_timestamp_is_monotonic() {
        let mut message = Message::new(1, 1, 1, "hi".into(), MessageType::Text, None);
        let now = Utc::now();
        message.edited_at = Some(now + Duration::seconds(5));

        let next = message.next_edit_timestamp(now);
        assert!(next > message.edited_at.unwrap());
    }

    #[test]
    fn test_first_edit_uses_now() {
        let message = Message::new(1, 1, 1, "hi".into(), MessageType::Text, None);
        let now = Utc::now();
        assert_eq!(message.next_edit_timestamp(now), now);
    }

    #[test]
    fn test_message_type_strings() {
        assert_eq!(MessageType::from_str("image"), Some(MessageType::Image));
        assert_eq!(MessageType::Video.as_str(), "VIDEO");
        assert!(!MessageType::Text.has_attachment());
        assert!(MessageType::File.has_attachment());
        assert_eq!(MessageType::from_str("sticker"), None);
    }
}
