//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints.

mod form;

pub mod health;
pub mod message;
pub mod room;
