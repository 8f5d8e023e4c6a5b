//! Token validation against the auth service's signing secret.

mod jwt;

pub use jwt::{Claims, JwtTokenValidator};
