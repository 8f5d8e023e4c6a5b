//! Read Receipt Repository Implementation
//!
//! PostgreSQL implementation of first-read receipts in `message_reads`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{MessageRead, ReadReceiptRepository};
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct ReadRow {
    message_id: i64,
    user_id: i64,
    read_at: DateTime<Utc>,
}

impl ReadRow {
    fn into_read(self) -> MessageRead {
        MessageRead {
            message_id: self.message_id,
            user_id: self.user_id,
            read_at: self.read_at,
        }
    }
}

/// PostgreSQL read receipt repository implementation.
#[derive(Clone)]
pub struct PgReadReceiptRepository {
    pool: PgPool,
}

impl PgReadReceiptRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadReceiptRepository for PgReadReceiptRepository {
    /// The primary key on (message_id, user_id) makes the first insert win;
    /// later calls read back the stored row.
    async fn mark_read(
        &self,
        message_id: i64,
        user_id: i64,
        read_at: DateTime<Utc>,
    ) -> Result<MessageRead, AppError> {
        sqlx::query(
            r#"
            INSERT INTO message_reads (message_id, user_id, read_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (message_id, user_id) DO NOTHING
            "#,
        )
        .bind(message_id)
        .bind(user_id)
        .bind(read_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::NotFound("Message not found".into())
            }
            _ => AppError::Database(e),
        })?;

        let row = sqlx::query_as::<_, ReadRow>(
            r#"
            SELECT message_id, user_id, read_at
            FROM message_reads
            WHERE message_id = $1 AND user_id = $2
            "#,
        )
        .bind(message_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Message not found".into()))?;

        Ok(row.into_read())
    }

    async fn find_by_message(&self, message_id: i64) -> Result<Vec<MessageRead>, AppError> {
        let rows = sqlx::query_as::<_, ReadRow>(
            r#"
            SELECT message_id, user_id, read_at
            FROM message_reads
            WHERE message_id = $1
            ORDER BY read_at ASC, user_id ASC
            "#,
        )
        .bind(message_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ReadRow::into_read).collect())
    }
}
