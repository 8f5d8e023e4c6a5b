//! Credential validation seam.

use crate::domain::entities::Identity;
use crate::shared::error::AppError;

/// Validates a presented credential and extracts the caller's identity.
///
/// The core never parses credentials itself; the boundary layer calls this
/// and threads the resulting [`Identity`] into every operation.
pub trait TokenValidator: Send + Sync {
    /// Fails `Unauthorized` for invalid or expired credentials.
    fn validate(&self, token: &str) -> Result<Identity, AppError>;
}
