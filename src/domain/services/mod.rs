//! # Domain Services
//!
//! Domain services and collaborator contracts that don't belong to a single
//! entity.
//!
//! ## Services
//!
//! - **AccessGuard**: room membership predicate
//! - **TokenValidator**: credential -> identity (implemented by the auth adapter)
//! - **FileStore**: byte storage returning public URLs

mod access_guard;
mod file_store;
mod identity;

pub use access_guard::{AccessDenied, AccessGuard};
pub use file_store::FileStore;
pub use identity::TokenValidator;

#[cfg(test)]
pub use file_store::MockFileStore;
