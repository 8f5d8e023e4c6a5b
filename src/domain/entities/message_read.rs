//! Read receipt entity and repository trait.
//!
//! Maps to the `message_reads` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// First time a user observed a message.
///
/// Maps to the `message_reads` table:
/// - message_id: BIGINT NOT NULL REFERENCES messages(id) ON DELETE CASCADE
/// - user_id: BIGINT NOT NULL
/// - read_at: TIMESTAMPTZ NOT NULL
///
/// The primary key (message_id, user_id) keeps one row per pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRead {
    pub message_id: i64,
    pub user_id: i64,
    pub read_at: DateTime<Utc>,
}

/// Repository trait for read receipts.
#[async_trait]
pub trait ReadReceiptRepository: Send + Sync {
    /// Insert a receipt unless one exists for the pair; returns the stored
    /// receipt either way, so the first `read_at` always wins.
    async fn mark_read(
        &self,
        message_id: i64,
        user_id: i64,
        read_at: DateTime<Utc>,
    ) -> Result<MessageRead, AppError>;

    /// All receipts of a message, earliest first.
    async fn find_by_message(&self, message_id: i64) -> Result<Vec<MessageRead>, AppError>;
}
