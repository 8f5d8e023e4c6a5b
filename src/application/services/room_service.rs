//! Room Directory Service
//!
//! Room creation, private-room deduplication and membership changes.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    AccessDenied, AccessGuard, ChatRoom, FileCategory, FileStore, Identity, PrivateRoomKey,
    RoomChanges, RoomRepository, Upload, UserDirectory, UserProfile,
};
use crate::shared::error::AppError;
use crate::shared::snowflake::SnowflakeGenerator;

/// Maximum room name length in characters.
pub const MAX_ROOM_NAME_LENGTH: usize = 100;

/// Room directory trait
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    /// Create a group room. The creator is always a member.
    async fn create_group(&self, creator_id: i64, request: CreateGroupDto) -> Result<ChatRoom, RoomError>;

    /// Return the private room between the caller and `other_user_id`
    /// (or the caller's self-chat), creating it on first contact.
    async fn get_or_create_private(&self, current: &Identity, other_user_id: i64) -> Result<PrivateRoom, RoomError>;

    /// List every room
    async fn list_rooms(&self) -> Result<Vec<ChatRoom>, RoomError>;

    /// Rename, re-avatar or toggle visibility of a group. Any member may do this.
    async fn update_group(&self, room_id: i64, requester_id: i64, request: UpdateGroupDto) -> Result<ChatRoom, RoomError>;

    /// Delete a group with its messages. Any member may do this.
    async fn delete_group(&self, room_id: i64, requester_id: i64) -> Result<(), RoomError>;

    /// Add users to a non-public group
    async fn invite_members(&self, room_id: i64, requester_id: i64, user_ids: Vec<i64>) -> Result<ChatRoom, RoomError>;

    /// Shareable join link of a public group
    async fn invite_link(&self, room_id: i64, requester_id: i64) -> Result<String, RoomError>;

    /// Join a public group
    async fn join_public(&self, room_id: i64, user_id: i64) -> Result<ChatRoom, RoomError>;

    /// Members of a room, visible to members only
    async fn get_members(&self, room_id: i64, requester_id: i64) -> Result<Vec<UserProfile>, RoomError>;
}

/// Result of [`RoomDirectory::get_or_create_private`]
#[derive(Debug, Clone)]
pub struct PrivateRoom {
    pub room: ChatRoom,
    /// False when the pair already had a room, including one created by a
    /// concurrent caller.
    pub created: bool,
}

/// Create group request
#[derive(Debug, Clone, Default)]
pub struct CreateGroupDto {
    pub name: String,
    pub member_ids: Vec<i64>,
    pub avatar: Option<Upload>,
    pub is_public: bool,
}

/// Update group request
#[derive(Debug, Clone, Default)]
pub struct UpdateGroupDto {
    pub name: Option<String>,
    pub avatar: Option<Upload>,
    pub is_public: Option<bool>,
}

/// Room directory errors
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("Room not found")]
    NotFound,

    #[error("Not a group chat")]
    NotGroup,

    #[error("User not found")]
    UserNotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Room name already exists")]
    NameTaken,

    #[error("Not a public group")]
    NotPublic,

    #[error("Not a private group")]
    PublicGroup,

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AppError> for RoomError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Conflict(_) => RoomError::NameTaken,
            AppError::Validation(msg) => RoomError::Validation(msg),
            AppError::NotFound(_) => RoomError::NotFound,
            AppError::Forbidden(_) => RoomError::Forbidden,
            e => RoomError::Internal(e.to_string()),
        }
    }
}

impl From<AccessDenied> for RoomError {
    fn from(_: AccessDenied) -> Self {
        RoomError::Forbidden
    }
}

impl From<RoomError> for AppError {
    fn from(error: RoomError) -> Self {
        match error {
            RoomError::NotFound | RoomError::NotGroup | RoomError::UserNotFound => {
                AppError::NotFound(error.to_string())
            }
            RoomError::Forbidden => AppError::Forbidden(error.to_string()),
            RoomError::NameTaken => AppError::Conflict(error.to_string()),
            RoomError::NotPublic | RoomError::PublicGroup => AppError::Validation(error.to_string()),
            RoomError::Validation(msg) => AppError::Validation(msg),
            RoomError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// RoomDirectory implementation
pub struct RoomDirectoryImpl<R>
where
    R: RoomRepository,
{
    room_repo: Arc<R>,
    users: Arc<dyn UserDirectory>,
    files: Arc<dyn FileStore>,
    id_generator: Arc<SnowflakeGenerator>,
    invite_base_url: String,
}

impl<R> RoomDirectoryImpl<R>
where
    R: RoomRepository,
{
    pub fn new(
        room_repo: Arc<R>,
        users: Arc<dyn UserDirectory>,
        files: Arc<dyn FileStore>,
        id_generator: Arc<SnowflakeGenerator>,
        invite_base_url: impl Into<String>,
    ) -> Self {
        Self {
            room_repo,
            users,
            files,
            id_generator,
            invite_base_url: invite_base_url.into(),
        }
    }

    async fn find_room(&self, room_id: i64) -> Result<ChatRoom, RoomError> {
        self.room_repo
            .find_by_id(room_id)
            .await?
            .ok_or(RoomError::NotFound)
    }

    async fn find_group(&self, room_id: i64) -> Result<ChatRoom, RoomError> {
        let room = self.find_room(room_id).await?;
        if !room.is_group() {
            return Err(RoomError::NotGroup);
        }
        Ok(room)
    }

    /// Ids among `user_ids` that resolve to known users.
    async fn known_users(&self, user_ids: &[i64]) -> Result<BTreeSet<i64>, RoomError> {
        let found: BTreeSet<i64> = self
            .users
            .find_many(user_ids)
            .await?
            .into_iter()
            .map(|u| u.id)
            .collect();

        for skipped in user_ids.iter().filter(|id| !found.contains(id)) {
            tracing::warn!(user_id = skipped, "Skipping unknown user id");
        }
        Ok(found)
    }

    async fn store_avatar(&self, avatar: Option<&Upload>) -> Result<Option<String>, RoomError> {
        match avatar {
            Some(upload) => Ok(Some(self.files.store(FileCategory::Avatar, upload).await?)),
            None => Ok(None),
        }
    }

    /// Undo a file store whose owning write failed.
    async fn discard_avatar(&self, url: Option<String>) {
        if let Some(url) = url {
            if let Err(e) = self.files.remove(&url).await {
                tracing::warn!(url = %url, error = %e, "Failed to remove orphaned avatar");
            }
        }
    }

    fn validate_name(name: &str) -> Result<&str, RoomError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RoomError::Validation("Group name is required".into()));
        }
        if name.chars().count() > MAX_ROOM_NAME_LENGTH {
            return Err(RoomError::Validation(format!(
                "Group name must be at most {} characters",
                MAX_ROOM_NAME_LENGTH
            )));
        }
        Ok(name)
    }
}

#[async_trait]
impl<R> RoomDirectory for RoomDirectoryImpl<R>
where
    R: RoomRepository + 'static,
{
    async fn create_group(&self, creator_id: i64, request: CreateGroupDto) -> Result<ChatRoom, RoomError> {
        let name = Self::validate_name(&request.name)?;

        if self.room_repo.name_exists(name).await? {
            return Err(RoomError::NameTaken);
        }
        if let Some(avatar) = &request.avatar {
            avatar.validate_avatar()?;
        }

        let mut members = self.known_users(&request.member_ids).await?;
        members.insert(creator_id);

        let avatar_url = self.store_avatar(request.avatar.as_ref()).await?;
        let room = ChatRoom::new_group(
            self.id_generator.generate(),
            name.to_string(),
            members,
            avatar_url.clone(),
            request.is_public,
        );

        match self.room_repo.create_group(&room).await {
            Ok(created) => {
                tracing::info!(
                    room_id = created.id,
                    creator_id = creator_id,
                    members = created.member_count(),
                    "Group room created"
                );
                Ok(created)
            }
            Err(e) => {
                self.discard_avatar(avatar_url).await;
                Err(e.into())
            }
        }
    }

    async fn get_or_create_private(&self, current: &Identity, other_user_id: i64) -> Result<PrivateRoom, RoomError> {
        let key = PrivateRoomKey::new(current.user_id, other_user_id);

        if let Some(existing) = self.room_repo.find_private(key).await? {
            tracing::debug!(room_id = existing.id, "Found existing private room");
            return Ok(PrivateRoom { room: existing, created: false });
        }

        let name = if key.is_self_chat() {
            format!("{}_self", current.username)
        } else {
            let other = self
                .users
                .find_by_id(other_user_id)
                .await?
                .ok_or(RoomError::UserNotFound)?;
            format!("{}_{}", current.username, other.username)
        };

        // The repository resolves a concurrent creator for the same key to
        // the room that won.
        let candidate = ChatRoom::new_private(self.id_generator.generate(), name, key);
        let room = match self.room_repo.create_private_or_get(&candidate).await {
            Ok(room) => room,
            // The pair may have been claimed between the lookup and the insert.
            Err(AppError::Conflict(msg)) => match self.room_repo.find_private(key).await? {
                Some(existing) => existing,
                None => return Err(AppError::Conflict(msg).into()),
            },
            Err(e) => return Err(e.into()),
        };
        let created = room.id == candidate.id;

        tracing::info!(
            room_id = room.id,
            members = ?room.members,
            created,
            "Private room ready"
        );
        Ok(PrivateRoom { room, created })
    }

    async fn list_rooms(&self) -> Result<Vec<ChatRoom>, RoomError> {
        Ok(self.room_repo.find_all().await?)
    }

    async fn update_group(&self, room_id: i64, requester_id: i64, request: UpdateGroupDto) -> Result<ChatRoom, RoomError> {
        let room = self.find_group(room_id).await?;
        AccessGuard::require_member(&room, requester_id)?;

        // Blank names leave the current name untouched.
        let name = match request.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => {
                let name = Self::validate_name(name)?;
                if name != room.name && self.room_repo.name_exists(name).await? {
                    return Err(RoomError::NameTaken);
                }
                Some(name.to_string())
            }
            None => None,
        };
        if let Some(avatar) = &request.avatar {
            avatar.validate_avatar()?;
        }

        let avatar_url = self.store_avatar(request.avatar.as_ref()).await?;
        let changes = RoomChanges {
            name,
            avatar_url: avatar_url.clone(),
            is_public: request.is_public,
        };
        if changes.is_empty() {
            return Ok(room);
        }

        match self.room_repo.update(room_id, &changes).await {
            Ok(Some(updated)) => {
                tracing::info!(room_id = room_id, requester_id = requester_id, "Group room updated");
                Ok(updated)
            }
            Ok(None) => {
                self.discard_avatar(avatar_url).await;
                Err(RoomError::NotFound)
            }
            Err(e) => {
                self.discard_avatar(avatar_url).await;
                Err(e.into())
            }
        }
    }

    async fn delete_group(&self, room_id: i64, requester_id: i64) -> Result<(), RoomError> {
        let room = self.find_group(room_id).await?;
        AccessGuard::require_member(&room, requester_id)?;

        if !self.room_repo.delete(room_id).await? {
            return Err(RoomError::NotFound);
        }

        tracing::info!(room_id = room_id, requester_id = requester_id, "Group room deleted");
        Ok(())
    }

    async fn invite_members(&self, room_id: i64, requester_id: i64, user_ids: Vec<i64>) -> Result<ChatRoom, RoomError> {
        let room = self.find_group(room_id).await?;
        if room.is_public {
            return Err(RoomError::PublicGroup);
        }
        AccessGuard::require_member(&room, requester_id)?;

        let invited: Vec<i64> = self.known_users(&user_ids).await?.into_iter().collect();
        if invited.is_empty() {
            return Ok(room);
        }

        let updated = self
            .room_repo
            .add_members(room_id, &invited)
            .await?
            .ok_or(RoomError::NotFound)?;

        tracing::info!(room_id = room_id, invited = ?invited, "Users invited to group");
        Ok(updated)
    }

    async fn invite_link(&self, room_id: i64, requester_id: i64) -> Result<String, RoomError> {
        let room = self.find_group(room_id).await?;
        if !room.is_public {
            return Err(RoomError::NotPublic);
        }
        AccessGuard::require_member(&room, requester_id)?;

        Ok(format!(
            "{}/join/{}",
            self.invite_base_url.trim_end_matches('/'),
            room.id
        ))
    }

    async fn join_public(&self, room_id: i64, user_id: i64) -> Result<ChatRoom, RoomError> {
        let room = self.find_group(room_id).await?;
        if !room.is_public {
            return Err(RoomError::NotPublic);
        }
        if AccessGuard::is_member(&room, user_id) {
            return Ok(room);
        }

        let updated = self
            .room_repo
            .add_members(room_id, &[user_id])
            .await?
            .ok_or(RoomError::NotFound)?;

        tracing::info!(room_id = room_id, user_id = user_id, "User joined public group");
        Ok(updated)
    }

    async fn get_members(&self, room_id: i64, requester_id: i64) -> Result<Vec<UserProfile>, RoomError> {
        let room = self.find_room(room_id).await?;
        AccessGuard::require_member(&room, requester_id)?;

        let ids: Vec<i64> = room.members.iter().copied().collect();
        let mut members = self.users.find_many(&ids).await?;
        members.sort_by_key(|u| u.id);
        Ok(members)
    }
}
