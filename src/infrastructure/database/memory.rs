//! In-process storage with the same consistency rules as the PostgreSQL schema.
//!
//! Rooms live under one lock together with their name and private-key
//! indexes, so check-then-insert on either index is atomic. Messages and read
//! receipts are sharded maps; each row is mutated under its own shard lock.
//!
//! Lock order is rooms, then messages, then reads. No path acquires them in
//! reverse.

use std::collections::HashMap;

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::domain::{ChatRoom, Message, MessageRead, PrivateRoomKey};

/// Room rows with their unique indexes.
#[derive(Debug, Default)]
pub(crate) struct RoomTables {
    pub by_id: HashMap<i64, ChatRoom>,
    /// Unique across private and group rooms
    pub names: HashMap<String, i64>,
    pub private_keys: HashMap<PrivateRoomKey, i64>,
}

impl RoomTables {
    pub fn insert(&mut self, room: ChatRoom) {
        self.names.insert(room.name.clone(), room.id);
        if let Some(key) = room.private_key() {
            self.private_keys.insert(key, room.id);
        }
        self.by_id.insert(room.id, room);
    }

    pub fn remove(&mut self, id: i64) -> Option<ChatRoom> {
        let room = self.by_id.remove(&id)?;
        self.names.remove(&room.name);
        if let Some(key) = room.private_key() {
            self.private_keys.remove(&key);
        }
        Some(room)
    }
}

/// Shared in-memory database handle. Repositories hold an `Arc` of it.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    pub(crate) rooms: RwLock<RoomTables>,
    pub(crate) messages: DashMap<i64, Message>,
    /// Keyed by (message_id, user_id)
    pub(crate) reads: DashMap<(i64, i64), MessageRead>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a message with its read receipts.
    pub(crate) fn remove_message(&self, id: i64) -> bool {
        if self.messages.remove(&id).is_none() {
            return false;
        }
        self.reads.retain(|(message_id, _), _| *message_id != id);
        true
    }

    /// Remove a room with its messages and their receipts.
    pub(crate) fn remove_room(&self, id: i64) -> bool {
        let mut rooms = self.rooms.write();
        if rooms.remove(id).is_none() {
            return false;
        }

        let mut removed = Vec::new();
        self.messages.retain(|message_id, message| {
            let keep = message.room_id != id;
            if !keep {
                removed.push(*message_id);
            }
            keep
        });
        self.reads
            .retain(|(message_id, _), _| !removed.contains(message_id));

        tracing::debug!(room_id = id, messages = removed.len(), "Room removed with its messages");
        true
    }
}
