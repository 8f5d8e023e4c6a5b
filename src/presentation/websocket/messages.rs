//! WebSocket Message Types
//!
//! Call-signaling frame formats. Payloads are opaque JSON objects (SDP
//! offers/answers, ICE candidates) forwarded untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque signaling payload
pub type Payload = Map<String, Value>;

/// Signal kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
    End,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offer => "offer",
            Self::Answer => "answer",
            Self::IceCandidate => "ice-candidate",
            Self::End => "end",
        }
    }
}

/// Incoming client frame
#[derive(Debug, Deserialize)]
pub struct ClientFrame {
    #[serde(rename = "type")]
    pub kind: SignalKind,
    #[serde(default)]
    pub payload: Option<Value>,
}

impl ClientFrame {
    /// Parse a text frame. A missing payload is an empty object; any other
    /// non-object payload is rejected.
    pub fn parse(text: &str) -> Result<(SignalKind, Payload), String> {
        let frame: ClientFrame =
            serde_json::from_str(text).map_err(|e| format!("Invalid signaling frame: {}", e))?;

        match frame.payload {
            None | Some(Value::Null) => Ok((frame.kind, Payload::new())),
            Some(Value::Object(payload)) => Ok((frame.kind, payload)),
            Some(_) => Err("payload must be a JSON object".to_string()),
        }
    }
}

/// Frame delivered to every subscriber of a call
#[derive(Debug, Clone, Serialize)]
pub struct SignalFrame<'a> {
    #[serde(rename = "type")]
    pub kind: SignalKind,
    /// Sender user id
    pub from: String,
    pub payload: &'a Payload,
}

/// Error reply to the sending connection only
#[derive(Debug, Serialize)]
pub struct ErrorFrame<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: &'a str,
}

impl<'a> ErrorFrame<'a> {
    pub fn new(message: &'a str) -> Self {
        Self { kind: "error", message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(r#"{"type":"offer","payload":{"sdp":"v=0"}}"#, SignalKind::Offer ; "offer")]
    #[test_case(r#"{"type":"ice-candidate","payload":{"candidate":"c"}}"#, SignalKind::IceCandidate ; "ice candidate")]
    #[test_case(r#"{"type":"end"}"#, SignalKind::End ; "end without payload")]
    fn test_parse_accepts(text: &str, kind: SignalKind) {
        let (parsed, _) = ClientFrame::parse(text).unwrap();
        assert_eq!(parsed, kind);
    }

    #[test_case(r#"{"type":"offer","payload":"sdp"}"# ; "string payload")]
    #[test_case(r#"{"type":"offer","payload":[1,2]}"# ; "array payload")]
    #[test_case(r#"{"type":"hangup","payload":{}}"# ; "unknown type")]
    #[test_case("not json" ; "garbage")]
    fn test_parse_rejects(text: &str) {
        assert!(ClientFrame::parse(text).is_err());
    }

    #[test]
    fn test_signal_frame_shape() {
        let mut payload = Payload::new();
        payload.insert("sdp".into(), Value::String("v=0".into()));
        let frame = SignalFrame {
            kind: SignalKind::Answer,
            from: "42".into(),
            payload: &payload,
        };

        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["type"], "answer");
        assert_eq!(json["from"], "42");
        assert_eq!(json["payload"]["sdp"], "v=0");
    }
}
