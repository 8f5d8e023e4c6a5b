//! In-memory repository implementations backed by [`MemoryDatabase`](crate::infrastructure::database::MemoryDatabase).
//!
//! Used when no database URL is configured, and by tests.

mod message;
mod read_receipt;
mod room;
mod user;

pub use message::InMemoryMessageRepository;
pub use read_receipt::InMemoryReadReceiptRepository;
pub use room::InMemoryRoomRepository;
pub use user::InMemoryUserDirectory;
