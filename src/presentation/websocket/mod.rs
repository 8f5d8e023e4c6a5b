//! Call Signaling
//!
//! WebSocket relay for WebRTC offer/answer/ICE/end frames between the
//! participants of a call.

pub mod handler;
pub mod messages;
pub mod relay;

pub use handler::signaling_handler;
pub use messages::{ClientFrame, Payload, SignalKind};
pub use relay::{SignalingRelay, Subscription};
