//! Response DTOs
//!
//! Data structures for API response bodies. Snowflake ids are serialized as
//! strings so JavaScript clients keep full precision.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::services::{MessageView, ReadReceiptDto};
use crate::domain::{ChatRoom, DeleteOutcome, Message, MessageRead, Reactions, UserProfile};

/// Room response
#[derive(Debug, Serialize)]
pub struct RoomResponse {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: String,
    pub avatar_url: Option<String>,
    pub is_public: bool,
    pub members: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<ChatRoom> for RoomResponse {
    fn from(room: ChatRoom) -> Self {
        Self {
            id: room.id.to_string(),
            name: room.name,
            room_type: room.room_type.as_str().to_string(),
            avatar_url: room.avatar_url,
            is_public: room.is_public,
            members: room.members.iter().map(|id| id.to_string()).collect(),
            created_at: room.created_at,
        }
    }
}

/// Room member response
#[derive(Debug, Serialize)]
pub struct MemberResponse {
    pub user_id: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

impl From<UserProfile> for MemberResponse {
    fn from(user: UserProfile) -> Self {
        Self {
            user_id: user.id.to_string(),
            username: user.username,
            avatar_url: user.avatar_url,
        }
    }
}

/// Invite link response
#[derive(Debug, Serialize)]
pub struct InviteLinkResponse {
    pub invite_link: String,
}

/// Emoji -> reacting user ids
pub type ReactionMap = BTreeMap<String, Vec<String>>;

fn reaction_map(reactions: &Reactions) -> ReactionMap {
    reactions
        .iter()
        .map(|(emoji, users)| (emoji.clone(), users.iter().map(|u| u.to_string()).collect()))
        .collect()
}

/// Message response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub room_id: String,
    pub sender_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_username: Option<String>,
    pub content: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub is_edited: bool,
    pub deleted_for_all: bool,
    pub reactions: ReactionMap,
}

impl MessageResponse {
    pub fn with_sender(message: Message, sender_username: Option<String>) -> Self {
        Self {
            id: message.id.to_string(),
            room_id: message.room_id.to_string(),
            sender_id: message.sender_id.to_string(),
            sender_username,
            is_edited: message.is_edited(),
            reactions: reaction_map(&message.reactions),
            content: message.content,
            message_type: message.message_type.as_str().to_string(),
            file_url: message.file_url,
            created_at: message.created_at,
            edited_at: message.edited_at,
            deleted_for_all: message.deleted_for_all,
        }
    }
}

impl From<MessageView> for MessageResponse {
    fn from(view: MessageView) -> Self {
        Self::with_sender(view.message, Some(view.sender_username))
    }
}

/// Reactions of one message after a change
#[derive(Debug, Serialize)]
pub struct ReactionsResponse {
    pub message_id: String,
    pub reactions: ReactionMap,
}

impl ReactionsResponse {
    pub fn new(message_id: i64, reactions: &Reactions) -> Self {
        Self {
            message_id: message_id.to_string(),
            reactions: reaction_map(reactions),
        }
    }
}

/// Delete outcome
#[derive(Debug, Serialize)]
pub struct DeleteMessageResponse {
    pub message_id: String,
    pub outcome: DeleteOutcome,
}

/// Stored read receipt of the caller
#[derive(Debug, Serialize)]
pub struct MessageReadResponse {
    pub message_id: String,
    pub user_id: String,
    pub read_at: DateTime<Utc>,
}

impl From<MessageRead> for MessageReadResponse {
    fn from(read: MessageRead) -> Self {
        Self {
            message_id: read.message_id.to_string(),
            user_id: read.user_id.to_string(),
            read_at: read.read_at,
        }
    }
}

/// Read receipt with reader name
#[derive(Debug, Serialize)]
pub struct ReadReceiptResponse {
    pub user_id: String,
    pub username: String,
    pub read_at: DateTime<Utc>,
}

impl From<ReadReceiptDto> for ReadReceiptResponse {
    fn from(receipt: ReadReceiptDto) -> Self {
        Self {
            user_id: receipt.user_id.to_string(),
            username: receipt.username,
            read_at: receipt.read_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageType;

    #[test]
    fn test_message_response_serializes_ids_as_strings() {
        let mut message = Message::new(
            1_234_567_890_123_456_789,
            7,
            42,
            "hi".into(),
            MessageType::Text,
            None,
        );
        message.reactions.add("👍", 42);

        let json = serde_json::to_value(MessageResponse::with_sender(message, Some("alice".into()))).unwrap();
        assert_eq!(json["id"], "1234567890123456789");
        assert_eq!(json["type"], "TEXT");
        assert_eq!(json["sender_username"], "alice");
        assert_eq!(json["reactions"]["👍"][0], "42");
        assert_eq!(json["is_edited"], false);
    }
}
