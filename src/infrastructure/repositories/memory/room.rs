use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ChatRoom, PrivateRoomKey, RoomChanges, RoomRepository};
use crate::infrastructure::database::MemoryDatabase;
use crate::shared::error::AppError;

const NAME_TAKEN: &str = "Room name already exists";

pub struct InMemoryRoomRepository {
    db: Arc<MemoryDatabase>,
}

impl InMemoryRoomRepository {
    pub fn new(db: Arc<MemoryDatabase>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<ChatRoom>, AppError> {
        Ok(self.db.rooms.read().by_id.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<ChatRoom>, AppError> {
        let mut rooms: Vec<ChatRoom> = self.db.rooms.read().by_id.values().cloned().collect();
        rooms.sort_by_key(|r| (r.created_at, r.id));
        Ok(rooms)
    }

    async fn find_private(&self, key: PrivateRoomKey) -> Result<Option<ChatRoom>, AppError> {
        let rooms = self.db.rooms.read();
        Ok(rooms
            .private_keys
            .get(&key)
            .and_then(|id| rooms.by_id.get(id))
            .cloned())
    }

    async fn name_exists(&self, name: &str) -> Result<bool, AppError> {
        Ok(self.db.rooms.read().names.contains_key(name))
    }

    async fn create_group(&self, room: &ChatRoom) -> Result<ChatRoom, AppError> {
        let mut rooms = self.db.rooms.write();
        if rooms.names.contains_key(&room.name) {
            return Err(AppError::Conflict(NAME_TAKEN.into()));
        }
        rooms.insert(room.clone());
        Ok(room.clone())
    }

    async fn create_private_or_get(&self, room: &ChatRoom) -> Result<ChatRoom, AppError> {
        let key = room
            .private_key()
            .ok_or_else(|| AppError::Internal("Private room without a valid member pair".into()))?;

        let mut rooms = self.db.rooms.write();
        if let Some(existing) = rooms.private_keys.get(&key).and_then(|id| rooms.by_id.get(id)) {
            return Ok(existing.clone());
        }
        if rooms.names.contains_key(&room.name) {
            return Err(AppError::Conflict(NAME_TAKEN.into()));
        }
        rooms.insert(room.clone());
        Ok(room.clone())
    }

    async fn update(&self, id: i64, changes: &RoomChanges) -> Result<Option<ChatRoom>, AppError> {
        let mut rooms = self.db.rooms.write();
        let Some(mut room) = rooms.by_id.get(&id).cloned() else {
            return Ok(None);
        };

        if let Some(name) = &changes.name {
            if *name != room.name {
                if rooms.names.contains_key(name) {
                    return Err(AppError::Conflict(NAME_TAKEN.into()));
                }
                rooms.names.remove(&room.name);
                room.name = name.clone();
            }
        }
        if let Some(avatar_url) = &changes.avatar_url {
            room.avatar_url = Some(avatar_url.clone());
        }
        if let Some(is_public) = changes.is_public {
            room.is_public = is_public;
        }

        rooms.insert(room.clone());
        Ok(Some(room))
    }

    async fn add_members(&self, id: i64, user_ids: &[i64]) -> Result<Option<ChatRoom>, AppError> {
        let mut rooms = self.db.rooms.write();
        Ok(rooms.by_id.get_mut(&id).map(|room| {
            room.members.extend(user_ids.iter().copied());
            room.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.db.remove_room(id))
    }
}
