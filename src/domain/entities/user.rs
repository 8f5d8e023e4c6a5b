//! User identity as seen by the chat core.
//!
//! Accounts, passwords and profile editing belong to the auth service; the
//! core only reads ids and display fields through [`UserDirectory`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Authenticated caller, produced by a [`TokenValidator`](crate::domain::services::TokenValidator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

/// Read-only user reference with display fields.
///
/// Maps to the `users` table owned by the auth service:
/// - id: BIGINT PRIMARY KEY
/// - username: VARCHAR(64) NOT NULL UNIQUE
/// - email: VARCHAR(255) NOT NULL UNIQUE
/// - avatar_url: TEXT NULL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

impl From<&Identity> for UserProfile {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.user_id,
            username: identity.username.clone(),
            email: identity.email.clone(),
            avatar_url: None,
        }
    }
}

/// Lookup of external user identities.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Find a user by id.
    async fn find_by_id(&self, id: i64) -> Result<Option<UserProfile>, AppError>;

    /// Find the users that exist among `ids`; unknown ids are skipped.
    async fn find_many(&self, ids: &[i64]) -> Result<Vec<UserProfile>, AppError>;

    /// Record an authenticated identity. Directories backed by the auth
    /// service's own table ignore this.
    async fn remember(&self, _identity: &Identity) -> Result<(), AppError> {
        Ok(())
    }
}
