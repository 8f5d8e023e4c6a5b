use std::collections::BTreeSet;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{Identity, UserDirectory, UserProfile};
use crate::shared::error::AppError;

/// User directory that learns users from authenticated requests.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: DashMap<i64, UserProfile>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: UserProfile) {
        self.users.insert(profile.id, profile);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, id: i64) -> Result<Option<UserProfile>, AppError> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_many(&self, ids: &[i64]) -> Result<Vec<UserProfile>, AppError> {
        let unique: BTreeSet<i64> = ids.iter().copied().collect();
        Ok(unique
            .into_iter()
            .filter_map(|id| self.users.get(&id).map(|u| u.value().clone()))
            .collect())
    }

    async fn remember(&self, identity: &Identity) -> Result<(), AppError> {
        self.users
            .entry(identity.user_id)
            .and_modify(|profile| {
                profile.username = identity.username.clone();
                profile.email = identity.email.clone();
            })
            .or_insert_with(|| UserProfile::from(identity));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_remember_keeps_avatar() {
        let users = InMemoryUserDirectory::new();
        users.insert(UserProfile {
            id: 1,
            username: "alice".into(),
            email: "alice@example.com".into(),
            avatar_url: Some("/uploads/avatars/a.png".into()),
        });

        let identity = Identity {
            user_id: 1,
            username: "alice2".into(),
            email: "alice@example.com".into(),
        };
        users.remember(&identity).await.unwrap();

        let profile = users.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(profile.username, "alice2");
        assert!(profile.avatar_url.is_some());
    }

    #[tokio::test]
    async fn test_find_many_skips_unknown_ids() {
        let users = InMemoryUserDirectory::new();
        users
            .remember(&Identity {
                user_id: 7,
                username: "gina".into(),
                email: "gina@example.com".into(),
            })
            .await
            .unwrap();

        let found = users.find_many(&[7, 8, 7]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].username, "gina");
    }
}
