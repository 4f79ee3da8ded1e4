//! Wire protocol for the debate call signaling relay.
//!
//! Browser peers exchange JSON text frames over a WebSocket. The relay
//! understands one frame itself (the room join) and forwards the rest.

mod messages;
mod types;

pub use messages::SignalMessage;
pub use types::{DebateId, InvalidDebateId};

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}
