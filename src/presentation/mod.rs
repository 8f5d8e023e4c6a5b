//! Presentation Layer
//!
//! HTTP routes and the signaling WebSocket.

pub mod http;
pub mod middleware;
pub mod websocket;
