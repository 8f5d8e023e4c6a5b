//! HTTP API
//!
//! REST handlers and the router that ties them to middleware.

pub mod handlers;
pub mod routes;
