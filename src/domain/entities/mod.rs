//! # Domain Entities
//!
//! Core domain entities of the chat backend.
//!
//! ## Core Entities
//!
//! - **ChatRoom**: a PRIVATE (1-2 members) or GROUP room with its member ids
//! - **Message**: a message in one room, with reactions and a tombstone flag
//! - **MessageRead**: first-read receipt per (message, user)
//!
//! ## Supporting Types
//!
//! - **UserProfile / Identity**: external user references
//! - **Upload**: a received file and the rules for accepting it
//! - **Reactions**: emoji -> user set, never holding empty sets
//!
//! ## Repository Traits
//!
//! Each stateful entity has a repository trait defining data access. These
//! traits are implemented in the infrastructure layer (PostgreSQL and
//! in-memory), following the dependency inversion principle.

mod attachment;
mod message;
mod message_read;
mod reaction;
mod room;
mod user;

pub use attachment::{FileCategory, Upload, MAX_ATTACHMENT_SIZE};
pub use message::{DeleteOutcome, Message, MessageRepository, MessageType, MAX_CONTENT_LENGTH};
pub use message_read::{MessageRead, ReadReceiptRepository};
pub use reaction::{Reactions, MAX_EMOJI_LENGTH};
pub use room::{ChatRoom, PrivateRoomKey, RoomChanges, RoomRepository, RoomType};
pub use user::{Identity, UserDirectory, UserProfile};

#[cfg(test)]
pub use message::MockMessageRepository;
#[cfg(test)]
pub use room::MockRoomRepository;
