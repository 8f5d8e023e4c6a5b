//! Message Repository Implementation
//!
//! PostgreSQL implementation of message storage. Reactions are kept one row
//! per (message, user, emoji) in `message_reactions` and folded into the
//! domain [`Reactions`] map on load.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::{Message, MessageRepository, MessageType, Reactions};
use crate::shared::error::AppError;

const MESSAGE_COLUMNS: &str = r#"
    id, room_id, sender_id, content, message_type, file_url,
    deleted_for_all, edited_at, created_at
"#;

/// New `edited_at`: the given time, or just past the stored one when that is
/// not older. Evaluated under the row lock so concurrent edits stay ordered.
const NEXT_EDITED_AT: &str =
    "GREATEST($3, COALESCE(edited_at + INTERVAL '1 microsecond', $3))";

fn update_content_sql() -> String {
    format!(
        "UPDATE messages SET content = $2, edited_at = {} WHERE id = $1 RETURNING {}",
        NEXT_EDITED_AT, MESSAGE_COLUMNS
    )
}

/// Internal row type for message queries.
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    room_id: i64,
    sender_id: i64,
    content: String,
    message_type: String,
    file_url: Option<String>,
    deleted_for_all: bool,
    edited_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    /// Converts database row to domain Message entity.
    fn into_message(self, reactions: Reactions) -> Message {
        Message {
            id: self.id,
            room_id: self.room_id,
            sender_id: self.sender_id,
            content: self.content,
            message_type: MessageType::from_str(&self.message_type).unwrap_or_default(),
            file_url: self.file_url,
            created_at: self.created_at,
            edited_at: self.edited_at,
            deleted_for_all: self.deleted_for_all,
            reactions,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ReactionRow {
    message_id: i64,
    user_id: i64,
    emoji: String,
}

/// PostgreSQL message repository implementation.
#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Creates a new PgMessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_reactions(&self, message_ids: &[i64]) -> Result<HashMap<i64, Reactions>, AppError> {
        let rows = sqlx::query_as::<_, ReactionRow>(
            r#"
            SELECT message_id, user_id, emoji
            FROM message_reactions
            WHERE message_id = ANY($1)
            "#,
        )
        .bind(message_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<i64, Reactions> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.message_id)
                .or_default()
                .add(&row.emoji, row.user_id);
        }
        Ok(grouped)
    }

    async fn attach_reactions(&self, row: MessageRow) -> Result<Message, AppError> {
        let mut reactions = self.load_reactions(&[row.id]).await?;
        let for_message = reactions.remove(&row.id).unwrap_or_default();
        Ok(row.into_message(for_message))
    }

    /// Lock the message row for the rest of the transaction. `false` if it is gone.
    async fn lock_message(tx: &mut Transaction<'static, Postgres>, id: i64) -> Result<bool, AppError> {
        let found = sqlx::query_scalar::<_, i64>("SELECT id FROM messages WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(found.is_some())
    }

    async fn reactions_in(tx: &mut Transaction<'static, Postgres>, id: i64) -> Result<Reactions, AppError> {
        let rows = sqlx::query_as::<_, ReactionRow>(
            "SELECT message_id, user_id, emoji FROM message_reactions WHERE message_id = $1",
        )
        .bind(id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows.into_iter().map(|r| (r.emoji, r.user_id)).collect())
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Message>, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {} FROM messages WHERE id = $1",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.attach_reactions(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_by_room(&self, room_id: i64) -> Result<Vec<Message>, AppError> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {} FROM messages WHERE room_id = $1 ORDER BY created_at ASC, id ASC",
            MESSAGE_COLUMNS
        ))
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut reactions = self.load_reactions(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let for_message = reactions.remove(&row.id).unwrap_or_default();
                row.into_message(for_message)
            })
            .collect())
    }

    async fn create(&self, message: &Message) -> Result<Message, AppError> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, room_id, sender_id, content, message_type, file_url,
                                  deleted_for_all, edited_at, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(message.id)
        .bind(message.room_id)
        .bind(message.sender_id)
        .bind(&message.content)
        .bind(message.message_type.as_str())
        .bind(&message.file_url)
        .bind(message.deleted_for_all)
        .bind(message.edited_at)
        .bind(message.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::NotFound("Room not found".into())
            }
            _ => AppError::Database(e),
        })?;

        Ok(message.clone())
    }

    async fn update_content(
        &self,
        id: i64,
        content: &str,
        edited_at: DateTime<Utc>,
    ) -> Result<Option<Message>, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(&update_content_sql())
        .bind(id)
        .bind(content)
        .bind(edited_at)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.attach_reactions(row).await?)),
            None => Ok(None),
        }
    }

    async fn mark_deleted_for_all(&self, id: i64) -> Result<Option<Message>, AppError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "UPDATE messages SET deleted_for_all = TRUE WHERE id = $1 RETURNING {}",
            MESSAGE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.attach_reactions(row).await?)),
            None => Ok(None),
        }
    }

    /// Reactions and read receipts go with the row via ON DELETE CASCADE.
    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Uses INSERT ON CONFLICT so a repeated reaction changes nothing.
    async fn add_reaction(
        &self,
        id: i64,
        user_id: i64,
        emoji: &str,
    ) -> Result<Option<Reactions>, AppError> {
        let mut tx = self.pool.begin().await?;
        if !Self::lock_message(&mut tx, id).await? {
            return Ok(None);
        }

        sqlx::query(
            r#"
            INSERT INTO message_reactions (message_id, user_id, emoji)
            VALUES ($1, $2, $3)
            ON CONFLICT (message_id, user_id, emoji) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(emoji)
        .execute(&mut *tx)
        .await?;

        let reactions = Self::reactions_in(&mut tx, id).await?;
        tx.commit().await?;
        Ok(Some(reactions))
    }

    async fn remove_reaction(
        &self,
        id: i64,
        user_id: i64,
        emoji: &str,
    ) -> Result<Option<Reactions>, AppError> {
        let mut tx = self.pool.begin().await?;
        if !Self::lock_message(&mut tx, id).await? {
            return Ok(None);
        }

        sqlx::query(
            r#"
            DELETE FROM message_reactions
            WHERE message_id = $1 AND user_id = $2 AND emoji = $3
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(emoji)
        .execute(&mut *tx)
        .await?;

        let reactions = Self::reactions_in(&mut tx, id).await?;
        tx.commit().await?;
        Ok(Some(reactions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_never_moves_edited_at_backwards() {
        let sql = update_content_sql();

        assert!(sql.contains("edited_at = GREATEST($3, COALESCE(edited_at + INTERVAL '1 microsecond', $3))"));
        assert!(!sql.contains("edited_at = $3 "));
    }
}
