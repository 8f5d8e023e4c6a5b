//! Message Store Service
//!
//! Handles message send, edit, delete, reactions and read receipts.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    AccessDenied, AccessGuard, ChatRoom, DeleteOutcome, FileCategory, FileStore, Message,
    MessageRead, MessageRepository, MessageType, Reactions, ReadReceiptRepository,
    RoomRepository, Upload, UserDirectory, MAX_CONTENT_LENGTH, MAX_EMOJI_LENGTH,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Message store trait
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Send a message to a room the sender belongs to
    async fn send(&self, room_id: i64, sender_id: i64, request: SendMessageDto) -> Result<Message, MessageError>;

    /// Store an attachment and send it as a message
    async fn upload(&self, room_id: i64, sender_id: i64, upload: Upload) -> Result<Message, MessageError>;

    /// Replace the content of one's own message
    async fn edit(&self, message_id: i64, requester_id: i64, content: &str) -> Result<Message, MessageError>;

    /// Delete a message for everyone (tombstone) or remove it outright
    async fn delete(&self, message_id: i64, requester_id: i64, for_all: bool) -> Result<DeleteOutcome, MessageError>;

    /// Add a reaction; idempotent per (emoji, user)
    async fn add_reaction(&self, message_id: i64, user_id: i64, emoji: &str) -> Result<Reactions, MessageError>;

    /// Remove a reaction; no-op if absent
    async fn remove_reaction(&self, message_id: i64, user_id: i64, emoji: &str) -> Result<Reactions, MessageError>;

    /// Record the first time a user read a message
    async fn mark_read(&self, message_id: i64, user_id: i64) -> Result<MessageRead, MessageError>;

    /// Read receipts of a message, earliest first
    async fn read_receipts(&self, message_id: i64) -> Result<Vec<ReadReceiptDto>, MessageError>;

    /// Messages of a room in chronological order
    async fn list_by_room(&self, room_id: i64) -> Result<Vec<MessageView>, MessageError>;
}

/// Send message request
#[derive(Debug, Clone, Default)]
pub struct SendMessageDto {
    pub content: String,
    pub message_type: MessageType,
    pub file_url: Option<String>,
}

/// A message with its sender's display name
#[derive(Debug, Clone)]
pub struct MessageView {
    pub message: Message,
    pub sender_username: String,
}

/// Read receipt joined with the reader's display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadReceiptDto {
    pub user_id: i64,
    pub username: String,
    pub read_at: DateTime<Utc>,
}

/// Message store errors
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("Message not found")]
    NotFound,

    #[error("Room not found")]
    RoomNotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Only the sender can edit this message")]
    NotSender,

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AppError> for MessageError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::NotFound(_) => MessageError::NotFound,
            AppError::Validation(msg) => MessageError::Validation(msg),
            AppError::Forbidden(_) => MessageError::Forbidden,
            e => MessageError::Internal(e.to_string()),
        }
    }
}

impl From<AccessDenied> for MessageError {
    fn from(_: AccessDenied) -> Self {
        MessageError::Forbidden
    }
}

impl From<MessageError> for AppError {
    fn from(error: MessageError) -> Self {
        match error {
            MessageError::NotFound | MessageError::RoomNotFound => AppError::NotFound(error.to_string()),
            MessageError::Forbidden | MessageError::NotSender => AppError::Forbidden(error.to_string()),
            MessageError::Validation(msg) => AppError::Validation(msg),
            MessageError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// MessageStore implementation
pub struct MessageStoreImpl<M, R, Rd>
where
    M: MessageRepository,
    R: RoomRepository,
    Rd: ReadReceiptRepository,
{
    message_repo: Arc<M>,
    room_repo: Arc<R>,
    read_repo: Arc<Rd>,
    users: Arc<dyn UserDirectory>,
    files: Arc<dyn FileStore>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<M, R, Rd> MessageStoreImpl<M, R, Rd>
where
    M: MessageRepository,
    R: RoomRepository,
    Rd: ReadReceiptRepository,
{
    pub fn new(
        message_repo: Arc<M>,
        room_repo: Arc<R>,
        read_repo: Arc<Rd>,
        users: Arc<dyn UserDirectory>,
        files: Arc<dyn FileStore>,
        id_generator: Arc<SnowflakeGenerator>,
    ) -> Self {
        Self {
            message_repo,
            room_repo,
            read_repo,
            users,
            files,
            id_generator,
        }
    }

    async fn find_room(&self, room_id: i64) -> Result<ChatRoom, MessageError> {
        self.room_repo
            .find_by_id(room_id)
            .await?
            .ok_or(MessageError::RoomNotFound)
    }

    async fn find_message(&self, message_id: i64) -> Result<Message, MessageError> {
        self.message_repo
            .find_by_id(message_id)
            .await?
            .ok_or(MessageError::NotFound)
    }

    /// The message together with the room it lives in, checked for membership.
    async fn find_for_member(&self, message_id: i64, user_id: i64) -> Result<(Message, ChatRoom), MessageError> {
        let message = self.find_message(message_id).await?;
        let room = self
            .room_repo
            .find_by_id(message.room_id)
            .await?
            .ok_or(MessageError::NotFound)?;
        AccessGuard::require_member(&room, user_id)?;
        Ok((message, room))
    }

    fn validate_text(content: &str) -> Result<(), MessageError> {
        if content.trim().is_empty() {
            return Err(MessageError::Validation("Message content is required".into()));
        }
        if content.chars().count() > MAX_CONTENT_LENGTH {
            return Err(MessageError::Validation(format!(
                "Message content must be at most {} characters",
                MAX_CONTENT_LENGTH
            )));
        }
        Ok(())
    }

    fn validate_emoji(emoji: &str) -> Result<(), MessageError> {
        if emoji.trim().is_empty() {
            return Err(MessageError::Validation("Emoji is required".into()));
        }
        if emoji.len() > MAX_EMOJI_LENGTH {
            return Err(MessageError::Validation(format!(
                "Emoji must be at most {} bytes",
                MAX_EMOJI_LENGTH
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<M, R, Rd> MessageStore for MessageStoreImpl<M, R, Rd>
where
    M: MessageRepository + 'static,
    R: RoomRepository + 'static,
    Rd: ReadReceiptRepository + 'static,
{
    async fn send(&self, room_id: i64, sender_id: i64, request: SendMessageDto) -> Result<Message, MessageError> {
        let file_url = if request.message_type.has_attachment() {
            match request.file_url.filter(|url| !url.trim().is_empty()) {
                Some(url) => Some(url),
                None => {
                    return Err(MessageError::Validation(format!(
                        "{} messages require a file_url",
                        request.message_type
                    )))
                }
            }
        } else {
            Self::validate_text(&request.content)?;
            None
        };
        if request.content.chars().count() > MAX_CONTENT_LENGTH {
            return Err(MessageError::Validation(format!(
                "Message content must be at most {} characters",
                MAX_CONTENT_LENGTH
            )));
        }

        let room = self.find_room(room_id).await?;
        AccessGuard::require_member(&room, sender_id)?;

        let message = Message::new(
            self.id_generator.generate(),
            room_id,
            sender_id,
            request.content,
            request.message_type,
            file_url,
        );
        let created = self.message_repo.create(&message).await?;

        tracing::info!(
            message_id = created.id,
            room_id = room_id,
            sender_id = sender_id,
            message_type = %created.message_type,
            "Message sent"
        );
        Ok(created)
    }

    async fn upload(&self, room_id: i64, sender_id: i64, upload: Upload) -> Result<Message, MessageError> {
        let message_type = upload.classify_attachment()?;

        let room = self.find_room(room_id).await?;
        AccessGuard::require_member(&room, sender_id)?;

        let url = self.files.store(FileCategory::MessageAttachment, &upload).await?;
        let message = Message::new(
            self.id_generator.generate(),
            room_id,
            sender_id,
            upload.filename.clone(),
            message_type,
            Some(url.clone()),
        );

        match self.message_repo.create(&message).await {
            Ok(created) => {
                tracing::info!(
                    message_id = created.id,
                    room_id = room_id,
                    size = upload.bytes.len(),
                    "Attachment uploaded"
                );
                Ok(created)
            }
            Err(e) => {
                if let Err(remove_err) = self.files.remove(&url).await {
                    tracing::warn!(url = %url, error = %remove_err, "Failed to remove orphaned attachment");
                }
                Err(e.into())
            }
        }
    }

    async fn edit(&self, message_id: i64, requester_id: i64, content: &str) -> Result<Message, MessageError> {
        let message = self.find_message(message_id).await?;

        if !message.is_sent_by(requester_id) {
            return Err(MessageError::NotSender);
        }
        if message.deleted_for_all {
            return Err(MessageError::Validation("Message was deleted".into()));
        }
        Self::validate_text(content)?;

        let edited_at = message.next_edit_timestamp(Utc::now());
        let updated = self
            .message_repo
            .update_content(message_id, content, edited_at)
            .await?
            .ok_or(MessageError::NotFound)?;

        tracing::info!(message_id = message_id, "Message edited");
        Ok(updated)
    }

    async fn delete(&self, message_id: i64, requester_id: i64, for_all: bool) -> Result<DeleteOutcome, MessageError> {
        let message = self.find_message(message_id).await?;
        let is_sender = message.is_sent_by(requester_id);

        if for_all {
            let allowed = is_sender || {
                // The other participant of a private room may retract for both.
                let room = self.room_repo.find_by_id(message.room_id).await?;
                room.map(|r| r.is_private() && AccessGuard::is_member(&r, requester_id))
                    .unwrap_or(false)
            };
            if allowed {
                self.message_repo
                    .mark_deleted_for_all(message_id)
                    .await?
                    .ok_or(MessageError::NotFound)?;
                tracing::info!(message_id = message_id, requester_id = requester_id, "Message deleted for all");
                return Ok(DeleteOutcome::Tombstoned);
            }
        }

        if !is_sender {
            return Err(MessageError::Forbidden);
        }
        if !self.message_repo.delete(message_id).await? {
            return Err(MessageError::NotFound);
        }

        tracing::info!(message_id = message_id, "Message removed");
        Ok(DeleteOutcome::Removed)
    }

    async fn add_reaction(&self, message_id: i64, user_id: i64, emoji: &str) -> Result<Reactions, MessageError> {
        Self::validate_emoji(emoji)?;
        self.find_for_member(message_id, user_id).await?;

        let reactions = self
            .message_repo
            .add_reaction(message_id, user_id, emoji)
            .await?
            .ok_or(MessageError::NotFound)?;

        tracing::debug!(message_id = message_id, user_id = user_id, emoji = %emoji, "Reaction added");
        Ok(reactions)
    }

    async fn remove_reaction(&self, message_id: i64, user_id: i64, emoji: &str) -> Result<Reactions, MessageError> {
        Self::validate_emoji(emoji)?;
        self.find_for_member(message_id, user_id).await?;

        let reactions = self
            .message_repo
            .remove_reaction(message_id, user_id, emoji)
            .await?
            .ok_or(MessageError::NotFound)?;

        tracing::debug!(message_id = message_id, user_id = user_id, emoji = %emoji, "Reaction removed");
        Ok(reactions)
    }

    async fn mark_read(&self, message_id: i64, user_id: i64) -> Result<MessageRead, MessageError> {
        self.find_for_member(message_id, user_id).await?;

        let read = self.read_repo.mark_read(message_id, user_id, Utc::now()).await?;
        tracing::debug!(message_id = message_id, user_id = user_id, read_at = %read.read_at, "Message read");
        Ok(read)
    }

    async fn read_receipts(&self, message_id: i64) -> Result<Vec<ReadReceiptDto>, MessageError> {
        self.find_message(message_id).await?;

        let reads = self.read_repo.find_by_message(message_id).await?;
        let ids: Vec<i64> = reads.iter().map(|r| r.user_id).collect();
        let names: HashMap<i64, String> = self
            .users
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        Ok(reads
            .into_iter()
            .filter_map(|read| {
                names.get(&read.user_id).map(|username| ReadReceiptDto {
                    user_id: read.user_id,
                    username: username.clone(),
                    read_at: read.read_at,
                })
            })
            .collect())
    }

    async fn list_by_room(&self, room_id: i64) -> Result<Vec<MessageView>, MessageError> {
        self.find_room(room_id).await?;

        let messages = self.message_repo.find_by_room(room_id).await?;
        let sender_ids: Vec<i64> = messages
            .iter()
            .map(|m| m.sender_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let senders: HashMap<i64, String> = self
            .users
            .find_many(&sender_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        // Messages whose sender can no longer be resolved are left out.
        Ok(messages
            .into_iter()
            .filter_map(|message| {
                senders.get(&message.sender_id).map(|name| MessageView {
                    sender_username: name.clone(),
                    message,
                })
            })
            .collect())
    }
}
