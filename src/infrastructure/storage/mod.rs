//! File storage backends.

mod local;

pub use local::LocalFileStore;

#[cfg(test)]
pub use local::DiscardFileStore;
