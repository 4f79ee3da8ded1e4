use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::types::DebateId;
use crate::ProtocolError;

/// A signaling frame as understood by the relay.
///
/// The relay only inspects enough of a frame to tell a room join apart
/// from the payloads it forwards. Session descriptions and ICE candidates
/// are kept as opaque JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum SignalMessage {
    /// `{"action": "join", "debateId": ...}`
    Join { debate_id: DebateId },

    /// `{"sdp": {"type": "offer" | "answer", ...}}`
    SessionDescription(Value),

    /// `{"candidate": {...}}`
    IceCandidate(Value),

    /// Valid JSON of any other shape
    Unknown,
}

impl SignalMessage {
    /// Decode a text frame.
    ///
    /// Only invalid JSON is an error. Shapes are matched in order: join,
    /// session description, ICE candidate. A `join` whose `debateId` is
    /// missing or invalid is not treated as a join.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(text)?;
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut fields) = value else {
            return SignalMessage::Unknown;
        };

        if let Some(debate_id) = join_target(&fields) {
            return SignalMessage::Join { debate_id };
        }

        if let Some(sdp) = take_non_null(&mut fields, "sdp") {
            return SignalMessage::SessionDescription(sdp);
        }

        if let Some(candidate) = take_non_null(&mut fields, "candidate") {
            return SignalMessage::IceCandidate(candidate);
        }

        SignalMessage::Unknown
    }

    pub fn join(debate_id: DebateId) -> Self {
        SignalMessage::Join { debate_id }
    }

    /// Encode into the wire form a browser client would send.
    pub fn encode(&self) -> String {
        let value = match self {
            SignalMessage::Join { debate_id } => json!({
                "action": "join",
                "debateId": debate_id,
            }),
            SignalMessage::SessionDescription(sdp) => json!({ "sdp": sdp }),
            SignalMessage::IceCandidate(candidate) => json!({ "candidate": candidate }),
            SignalMessage::Unknown => Value::Object(Map::new()),
        };
        value.to_string()
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SignalMessage::Join { .. } => "join",
            SignalMessage::SessionDescription(_) => "sdp",
            SignalMessage::IceCandidate(_) => "candidate",
            SignalMessage::Unknown => "unknown",
        }
    }

    /// The `type` of a session description (`offer`, `answer`, ...).
    pub fn sdp_type(&self) -> Option<&str> {
        match self {
            SignalMessage::SessionDescription(sdp) => sdp.get("type").and_then(Value::as_str),
            _ => None,
        }
    }
}

fn join_target(fields: &Map<String, Value>) -> Option<DebateId> {
    if fields.get("action").and_then(Value::as_str) != Some("join") {
        return None;
    }
    fields
        .get("debateId")
        .and_then(|id| DebateId::deserialize(id).ok())
}

fn take_non_null(fields: &mut Map<String, Value>, key: &str) -> Option<Value> {
    match fields.remove(key) {
        Some(Value::Null) | None => None,
        Some(value) => Some(value),
    }
}
