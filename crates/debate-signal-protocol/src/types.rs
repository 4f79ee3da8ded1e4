use serde::{Deserialize, Serialize};
use std::fmt;

/// Room key supplied by the browser client.
///
/// Clients send the debate id either as a string or as a bare integer;
/// both spellings name the same room, so `42` and `"42"` decode to the
/// same `DebateId`. Always serialized as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawDebateId", into = "String")]
pub struct DebateId(String);

impl DebateId {
    pub fn new(id: impl Into<String>) -> Result<Self, InvalidDebateId> {
        let id = id.into();
        if id.is_empty() {
            return Err(InvalidDebateId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DebateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DebateId> for String {
    fn from(id: DebateId) -> Self {
        id.0
    }
}

impl TryFrom<&str> for DebateId {
    type Error = InvalidDebateId;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("debate id must be a non-empty string or an integer")]
pub struct InvalidDebateId;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDebateId {
    Text(String),
    Number(serde_json::Number),
}

impl TryFrom<RawDebateId> for DebateId {
    type Error = InvalidDebateId;

    fn try_from(raw: RawDebateId) -> Result<Self, Self::Error> {
        match raw {
            RawDebateId::Text(text) => Self::new(text),
            RawDebateId::Number(n) if n.is_i64() || n.is_u64() => Self::new(n.to_string()),
            RawDebateId::Number(_) => Err(InvalidDebateId),
        }
    }
}
