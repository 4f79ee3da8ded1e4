use crate::ws::rooms::{JoinOutcome, RoomRegistry};
use chrono::{DateTime, Utc};
use debate_signal_protocol::{DebateId, SignalMessage};
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

/// What the relay did with one inbound frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Not valid JSON; dropped
    Malformed,
    Joined { debate_id: DebateId, members: usize },
    /// Forwarded to `delivered` other members of the sender's room
    Relayed { kind: &'static str, delivered: usize },
    /// Sender has not joined a room; dropped
    Unjoined,
    /// Sender was already disconnected; dropped
    Closed,
    /// Unrecognised shape with forwarding disabled; dropped
    Ignored,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomSnapshot {
    pub debate_id: DebateId,
    pub members: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
struct Connections {
    /// Map from connection ID to message sender channel
    senders: HashMap<Uuid, mpsc::UnboundedSender<String>>,
    rooms: RoomRegistry,
}

/// The signaling relay.
///
/// Senders and room membership live behind one lock so that joins,
/// relays and disconnects for the same room are applied in arrival order.
pub struct ConnectionManager {
    inner: RwLock<Connections>,
    forward_unknown: bool,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::with_forward_unknown(true)
    }

    /// Frames that are not a join are relayed whatever their shape. With
    /// `forward_unknown` unset, only session descriptions and ICE
    /// candidates are relayed and anything else is dropped.
    pub fn with_forward_unknown(forward_unknown: bool) -> Self {
        Self {
            inner: RwLock::new(Connections::default()),
            forward_unknown,
        }
    }

    pub async fn add_connection(&self, connection_id: Uuid, sender: mpsc::UnboundedSender<String>) {
        self.inner.write().await.senders.insert(connection_id, sender);
        tracing::debug!("Connection {} opened", connection_id);
    }

    pub async fn remove_connection(&self, connection_id: Uuid) {
        let mut inner = self.inner.write().await;

        if let Some(outcome) = inner.rooms.leave(connection_id) {
            tracing::debug!("Connection {} left debate {}", connection_id, outcome.room);
            if outcome.room_closed {
                tracing::info!("Debate room {} closed", outcome.room);
            }
        }

        if inner.senders.remove(&connection_id).is_some() {
            tracing::debug!("Connection {} closed", connection_id);
        }
    }

    /// Handle one inbound text frame from `connection_id`.
    pub async fn handle_text(&self, connection_id: Uuid, raw: &str) -> Dispatch {
        let message = match SignalMessage::decode(raw) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!("Invalid message from {}: {}", connection_id, e);
                return Dispatch::Malformed;
            }
        };

        match message {
            SignalMessage::Join { debate_id } => self.join_room(connection_id, debate_id).await,
            SignalMessage::Unknown if !self.forward_unknown => {
                tracing::debug!("Ignoring unrecognised message from {}", connection_id);
                Dispatch::Ignored
            }
            other => {
                if let Some(sdp_type) = other.sdp_type() {
                    tracing::debug!("Connection {} sent {} description", connection_id, sdp_type);
                }
                self.relay(connection_id, other.kind(), raw).await
            }
        }
    }

    pub async fn join_room(&self, connection_id: Uuid, debate_id: DebateId) -> Dispatch {
        let mut inner = self.inner.write().await;

        // A frame can race the disconnect cleanup; never register a closed connection.
        if !inner.senders.contains_key(&connection_id) {
            tracing::debug!("Ignoring join from closed connection {}", connection_id);
            return Dispatch::Closed;
        }

        let members = match inner.rooms.join(connection_id, debate_id.clone()) {
            JoinOutcome::Joined { members } | JoinOutcome::AlreadyMember { members } => members,
            JoinOutcome::Moved {
                from,
                from_closed,
                members,
            } => {
                tracing::debug!("Connection {} left debate {}", connection_id, from);
                if from_closed {
                    tracing::info!("Debate room {} closed", from);
                }
                members
            }
        };

        tracing::info!(
            "Connection {} joined debate {}. Total in room: {}",
            connection_id,
            debate_id,
            members
        );

        Dispatch::Joined { debate_id, members }
    }

    /// Forward `raw` unmodified to every other open connection in the
    /// sender's room.
    pub async fn relay(&self, connection_id: Uuid, kind: &'static str, raw: &str) -> Dispatch {
        let inner = self.inner.read().await;

        if !inner.senders.contains_key(&connection_id) {
            tracing::debug!("Dropping {} from closed connection {}", kind, connection_id);
            return Dispatch::Closed;
        }

        let Some((debate_id, peers)) = inner.rooms.peers_of(connection_id) else {
            tracing::debug!("Dropping {} from {}: not in a debate room", kind, connection_id);
            return Dispatch::Unjoined;
        };

        let mut delivered = 0;
        for peer_id in &peers {
            let Some(sender) = inner.senders.get(peer_id) else {
                continue;
            };
            if sender.is_closed() {
                continue;
            }
            match sender.send(raw.to_owned()) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::error!("Failed to send message to {}: {}", peer_id, e),
            }
        }

        tracing::debug!(
            "Relayed {} from {} to {} of {} peers in debate {}",
            kind,
            connection_id,
            delivered,
            peers.len(),
            debate_id
        );

        Dispatch::Relayed { kind, delivered }
    }

    pub async fn room_snapshot(&self, debate_id: &DebateId) -> Option<RoomSnapshot> {
        let inner = self.inner.read().await;
        inner.rooms.room(debate_id).map(|room| RoomSnapshot {
            debate_id: debate_id.clone(),
            members: room.members.len(),
            created_at: room.created_at,
        })
    }

    /// All rooms, ordered by debate id
    pub async fn room_snapshots(&self) -> Vec<RoomSnapshot> {
        let inner = self.inner.read().await;
        let mut rooms: Vec<RoomSnapshot> = inner
            .rooms
            .rooms()
            .map(|(debate_id, room)| RoomSnapshot {
                debate_id: debate_id.clone(),
                members: room.members.len(),
                created_at: room.created_at,
            })
            .collect();
        rooms.sort_by(|a, b| a.debate_id.cmp(&b.debate_id));
        rooms
    }

    pub async fn room_of(&self, connection_id: Uuid) -> Option<DebateId> {
        self.inner.read().await.rooms.room_of(connection_id).cloned()
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.senders.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
