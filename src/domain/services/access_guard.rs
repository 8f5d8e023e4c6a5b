//! Membership checks shared by the room and message services.

use crate::domain::entities::ChatRoom;

/// Raised when a caller is not a member of the room it acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("user {user_id} is not a member of room {room_id}")]
pub struct AccessDenied {
    pub room_id: i64,
    pub user_id: i64,
}

/// Membership predicate. Holds no state; membership is read from the room.
pub struct AccessGuard;

impl AccessGuard {
    /// Pure membership test.
    pub fn is_member(room: &ChatRoom, user_id: i64) -> bool {
        room.members.contains(&user_id)
    }

    /// Fail unless `user_id` belongs to `room`.
    pub fn require_member(room: &ChatRoom, user_id: i64) -> Result<(), AccessDenied> {
        if Self::is_member(room, user_id) {
            Ok(())
        } else {
            Err(AccessDenied {
                room_id: room.id,
                user_id,
            })
        }
    }
}
