//! Repository Implementations
//!
//! Concrete implementations of the repository traits defined in the domain
//! layer: PostgreSQL for deployments, in-memory for single-process runs and
//! tests.
//!
//! ## Available Repositories
//!
//! - **PgRoomRepository** - Rooms, membership and private-room deduplication
//! - **PgMessageRepository** - Messages with their reactions
//! - **PgReadReceiptRepository** - First-read receipts
//! - **PgUserDirectory** - Read-only lookups in the auth service's `users` table
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use crate::infrastructure::repositories::{PgMessageRepository, PgRoomRepository};
//!
//! async fn setup_repositories(pool: PgPool) {
//!     let room_repo = PgRoomRepository::new(pool.clone());
//!     let message_repo = PgMessageRepository::new(pool.clone());
//! }
//! ```

pub mod memory;
pub mod message_repository;
pub mod read_receipt_repository;
pub mod room_repository;
pub mod user_repository;

pub use message_repository::PgMessageRepository;
pub use read_receipt_repository::PgReadReceiptRepository;
pub use room_repository::PgRoomRepository;
pub use user_repository::PgUserDirectory;
