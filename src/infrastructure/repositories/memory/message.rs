use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Message, MessageRepository, Reactions};
use crate::infrastructure::database::MemoryDatabase;
use crate::shared::error::AppError;

pub struct InMemoryMessageRepository {
    db: Arc<MemoryDatabase>,
}

impl InMemoryMessageRepository {
    pub fn new(db: Arc<MemoryDatabase>) -> Self {
        Self { db }
    }

    /// Mutate a message under its row lock.
    fn modify<T>(&self, id: i64, f: impl FnOnce(&mut Message) -> T) -> Option<T> {
        self.db.messages.get_mut(&id).map(|mut entry| f(entry.value_mut()))
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, AppError> {
        Ok(self.db.messages.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_room(&self, room_id: i64) -> Result<Vec<Message>, AppError> {
        let mut messages: Vec<Message> = self
            .db
            .messages
            .iter()
            .filter(|entry| entry.room_id == room_id)
            .map(|entry| entry.value().clone())
            .collect();
        messages.sort_by_key(|m| (m.created_at, m.id));
        Ok(messages)
    }

    async fn create(&self, message: &Message) -> Result<Message, AppError> {
        // Held across the insert so a concurrent room delete cannot orphan the row.
        let rooms = self.db.rooms.read();
        if !rooms.by_id.contains_key(&message.room_id) {
            return Err(AppError::NotFound("Room not found".into()));
        }
        self.db.messages.insert(message.id, message.clone());
        Ok(message.clone())
    }

    async fn update_content(
        &self,
        id: i64,
        content: &str,
        edited_at: DateTime<Utc>,
    ) -> Result<Option<Message>, AppError> {
        Ok(self.modify(id, |message| {
            message.content = content.to_string();
            message.edited_at = Some(message.next_edit_timestamp(edited_at));
            message.clone()
        }))
    }

    async fn mark_deleted_for_all(&self, id: i64) -> Result<Option<Message>, AppError> {
        Ok(self.modify(id, |message| {
            message.deleted_for_all = true;
            message.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.db.remove_message(id))
    }

    async fn add_reaction(
        &self,
        id: i64,
        user_id: i64,
        emoji: &str,
    ) -> Result<Option<Reactions>, AppError> {
        Ok(self.modify(id, |message| {
            message.reactions.add(emoji, user_id);
            message.reactions.clone()
        }))
    }

    async fn remove_reaction(
        &self,
        id: i64,
        user_id: i64,
        emoji: &str,
    ) -> Result<Option<Reactions>, AppError> {
        Ok(self.modify(id, |message| {
            message.reactions.remove(emoji, user_id);
            message.reactions.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageType;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_into_missing_room_fails() {
        let repo = InMemoryMessageRepository::new(Arc::new(MemoryDatabase::new()));
        let message = Message::new(1, 404, 1, "hi".into(), MessageType::Text, None);

        assert!(matches!(
            repo.create(&message).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_mutations_on_missing_message_return_none() {
        let repo = InMemoryMessageRepository::new(Arc::new(MemoryDatabase::new()));

        assert!(repo.add_reaction(1, 1, "👍").await.unwrap().is_none());
        assert!(repo.mark_deleted_for_all(1).await.unwrap().is_none());
        assert!(!repo.delete(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_edit_timestamp_still_moves_forward() {
        let repo = InMemoryMessageRepository::new(Arc::new(MemoryDatabase::new()));
        let message = Message::new(1, 10, 1, "hi".into(), MessageType::Text, None);
        repo.db.messages.insert(message.id, message.clone());

        let later = message.created_at + Duration::seconds(5);
        let earlier = message.created_at + Duration::seconds(2);
        repo.update_content(1, "second", later).await.unwrap();
        let edited = repo.update_content(1, "first", earlier).await.unwrap().unwrap();

        assert_eq!(edited.content, "first");
        assert_eq!(edited.edited_at, Some(later + Duration::microseconds(1)));
    }
}
