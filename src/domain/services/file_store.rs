//! File storage seam.

use async_trait::async_trait;

use crate::domain::entities::{FileCategory, Upload};
use crate::shared::error::AppError;

/// Persists uploaded bytes and hands back a publicly resolvable URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store the upload and return its URL.
    async fn store(&self, category: FileCategory, upload: &Upload) -> Result<String, AppError>;

    /// Remove a previously stored file. Used to undo a store when the
    /// operation it belonged to fails.
    async fn remove(&self, url: &str) -> Result<(), AppError>;
}
