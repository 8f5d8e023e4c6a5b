//! # Domain Layer
//!
//! The domain layer contains the core chat model: rooms, membership,
//! messages, reactions and read receipts.
//! It is independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: Core domain entities (ChatRoom, Message, MessageRead, ...)
//! - **services**: Access guard and collaborator contracts (token validation, file storage)
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Rooms reference member ids, messages reference a room id and sender id
//! - Repository traits define data access contracts
//! - Entities encapsulate domain invariants

pub mod entities;
pub mod services;

// Re-export commonly used types
pub use entities::*;
pub use services::*;
