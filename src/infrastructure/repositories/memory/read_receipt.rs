use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{MessageRead, ReadReceiptRepository};
use crate::infrastructure::database::MemoryDatabase;
use crate::shared::error::AppError;

pub struct InMemoryReadReceiptRepository {
    db: Arc<MemoryDatabase>,
}

impl InMemoryReadReceiptRepository {
    pub fn new(db: Arc<MemoryDatabase>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ReadReceiptRepository for InMemoryReadReceiptRepository {
    async fn mark_read(
        &self,
        message_id: i64,
        user_id: i64,
        read_at: DateTime<Utc>,
    ) -> Result<MessageRead, AppError> {
        // The message row stays locked while the receipt is written, so a
        // concurrent delete cannot leave an orphaned receipt behind.
        let Some(_message) = self.db.messages.get(&message_id) else {
            return Err(AppError::NotFound("Message not found".into()));
        };

        let read = self
            .db
            .reads
            .entry((message_id, user_id))
            .or_insert_with(|| MessageRead {
                message_id,
                user_id,
                read_at,
            });
        Ok(read.value().clone())
    }

    async fn find_by_message(&self, message_id: i64) -> Result<Vec<MessageRead>, AppError> {
        let mut reads: Vec<MessageRead> = self
            .db
            .reads
            .iter()
            .filter(|entry| entry.key().0 == message_id)
            .map(|entry| entry.value().clone())
            .collect();
        reads.sort_by_key(|r| (r.read_at, r.user_id));
        Ok(reads)
    }
}
