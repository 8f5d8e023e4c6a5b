//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **RoomDirectory**: room creation, private-room dedup, membership management
//! - **MessageStore**: message CRUD, reactions, read receipts

pub mod message_service;
pub mod room_service;

// Re-export room directory types
pub use room_service::{
    CreateGroupDto, PrivateRoom, RoomDirectory, RoomDirectoryImpl, RoomError, UpdateGroupDto,
};

// Re-export message store types
pub use message_service::{
    MessageError, MessageStore, MessageStoreImpl, MessageView, ReadReceiptDto, SendMessageDto,
};
