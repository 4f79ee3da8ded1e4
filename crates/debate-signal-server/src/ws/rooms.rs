use chrono::{DateTime, Utc};
use debate_signal_protocol::DebateId;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Room {
    /// Members in join order
    pub members: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined { members: usize },
    AlreadyMember { members: usize },
    /// Left `from` (closing it if it emptied) and joined the new room
    Moved {
        from: DebateId,
        from_closed: bool,
        members: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub room: DebateId,
    pub room_closed: bool,
}

/// Room membership for every joined connection.
///
/// A connection is in at most one room, and a room exists only while it
/// has at least one member.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Map from connection ID to the room it joined
    room_of: HashMap<Uuid, DebateId>,
    /// Map from room ID to its members
    rooms: HashMap<DebateId, Room>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self, connection_id: Uuid, debate_id: DebateId) -> JoinOutcome {
        let current = self.room_of.get(&connection_id).cloned();
        let previous = match current {
            Some(current) if current == debate_id => {
                return JoinOutcome::AlreadyMember {
                    members: self.member_count(&debate_id),
                };
            }
            Some(_) => self.leave(connection_id),
            None => None,
        };

        self.rooms
            .entry(debate_id.clone())
            .or_insert_with(|| Room {
                members: Vec::new(),
                created_at: Utc::now(),
            })
            .members
            .push(connection_id);
        let members = self.member_count(&debate_id);
        self.room_of.insert(connection_id, debate_id);

        match previous {
            Some(LeaveOutcome { room, room_closed }) => JoinOutcome::Moved {
                from: room,
                from_closed: room_closed,
                members,
            },
            None => JoinOutcome::Joined { members },
        }
    }

    /// Remove a connection from its room. Returns `None` if it was not in one.
    pub fn leave(&mut self, connection_id: Uuid) -> Option<LeaveOutcome> {
        let debate_id = self.room_of.remove(&connection_id)?;

        let room_closed = match self.rooms.get_mut(&debate_id) {
            Some(room) => {
                room.members.retain(|member| *member != connection_id);
                room.members.is_empty()
            }
            None => false,
        };

        if room_closed {
            self.rooms.remove(&debate_id);
        }

        Some(LeaveOutcome {
            room: debate_id,
            room_closed,
        })
    }

    /// The room of a connection and every other member of it, in join order.
    pub fn peers_of(&self, connection_id: Uuid) -> Option<(&DebateId, Vec<Uuid>)> {
        let debate_id = self.room_of.get(&connection_id)?;
        let peers = self
            .rooms
            .get(debate_id)
            .map(|room| {
                room.members
                    .iter()
                    .copied()
                    .filter(|member| *member != connection_id)
                    .collect()
            })
            .unwrap_or_default();
        Some((debate_id, peers))
    }

    pub fn room_of(&self, connection_id: Uuid) -> Option<&DebateId> {
        self.room_of.get(&connection_id)
    }

    pub fn room(&self, debate_id: &DebateId) -> Option<&Room> {
        self.rooms.get(debate_id)
    }

    pub fn rooms(&self) -> impl Iterator<Item = (&DebateId, &Room)> {
        self.rooms.iter()
    }

    pub fn contains_room(&self, debate_id: &DebateId) -> bool {
        self.rooms.contains_key(debate_id)
    }

    pub fn member_count(&self, debate_id: &DebateId) -> usize {
        self.rooms
            .get(debate_id)
            .map(|room| room.members.len())
            .unwrap_or(0)
    }

    /// Number of rooms
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> DebateId {
        DebateId::new(s).unwrap()
    }

    fn assert_consistent(registry: &RoomRegistry) {
        for (debate_id, room) in &registry.rooms {
            assert!(!room.members.is_empty(), "room {debate_id} is empty");
            for member in &room.members {
                assert_eq!(registry.room_of.get(member), Some(debate_id));
            }
        }
        for (member, debate_id) in &registry.room_of {
            let room = registry.rooms.get(debate_id).expect("member of a missing room");
            assert_eq!(room.members.iter().filter(|m| *m == member).count(), 1);
        }
    }

    #[test]
    fn test_join_then_leave_removes_room() {
        let mut registry = RoomRegistry::new();
        let a = Uuid::new_v4();

        assert_eq!(registry.join(a, id("1")), JoinOutcome::Joined { members: 1 });
        assert!(registry.contains_room(&id("1")));

        let outcome = registry.leave(a).unwrap();
        assert_eq!(outcome.room, id("1"));
        assert!(outcome.room_closed);
        assert!(registry.is_empty());
        assert_consistent(&registry);
    }

    #[test]
    fn test_leave_is_idempotent() {
        let mut registry = RoomRegistry::new();
        let a = Uuid::new_v4();
        registry.join(a, id("1"));

        assert!(registry.leave(a).is_some());
        assert!(registry.leave(a).is_none());
        assert!(registry.leave(Uuid::new_v4()).is_none());
        assert_consistent(&registry);
    }

    #[test]
    fn test_room_survives_until_last_member_leaves() {
        let mut registry = RoomRegistry::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        registry.join(a, id("42"));
        assert_eq!(registry.join(b, id("42")), JoinOutcome::Joined { members: 2 });

        let outcome = registry.leave(a).unwrap();
        assert!(!outcome.room_closed);
        assert_eq!(registry.member_count(&id("42")), 1);

        assert!(registry.leave(b).unwrap().room_closed);
        assert!(!registry.contains_room(&id("42")));
    }

    #[test]
    fn test_rejoining_same_room_does_not_duplicate() {
        let mut registry = RoomRegistry::new();
        let a = Uuid::new_v4();
        registry.join(a, id("1"));

        assert_eq!(
            registry.join(a, id("1")),
            JoinOutcome::AlreadyMember { members: 1 }
        );
        assert_consistent(&registry);
    }

    #[test]
    fn test_joining_another_room_moves_connection() {
        let mut registry = RoomRegistry::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        registry.join(a, id("1"));
        registry.join(b, id("1"));

        assert_eq!(
            registry.join(a, id("2")),
            JoinOutcome::Moved {
                from: id("1"),
                from_closed: false,
                members: 1
            }
        );
        assert_eq!(registry.room_of(a), Some(&id("2")));
        assert_eq!(registry.member_count(&id("1")), 1);

        assert_eq!(
            registry.join(b, id("2")),
            JoinOutcome::Moved {
                from: id("1"),
                from_closed: true,
                members: 2
            }
        );
        assert!(!registry.contains_room(&id("1")));
        assert_consistent(&registry);
    }

    #[test]
    fn test_peers_exclude_self_and_keep_join_order() {
        let mut registry = RoomRegistry::new();
        let (a, b, c, d) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        registry.join(a, id("1"));
        registry.join(b, id("1"));
        registry.join(c, id("1"));
        registry.join(d, id("2"));

        let (room, peers) = registry.peers_of(b).unwrap();
        assert_eq!(room, &id("1"));
        assert_eq!(peers, vec![a, c]);

        let (_, peers) = registry.peers_of(d).unwrap();
        assert!(peers.is_empty());

        assert!(registry.peers_of(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_interleaved_operations_keep_invariants() {
        let mut registry = RoomRegistry::new();
        let conns: Vec<Uuid> = (0..6).map(|_| Uuid::new_v4()).collect();
        let rooms = ["1", "2", "3"];

        for step in 0..60 {
            let conn = conns[step % conns.len()];
            if step % 4 == 3 {
                registry.leave(conn);
            } else {
                registry.join(conn, id(rooms[(step * 7) % rooms.len()]));
            }
            assert_consistent(&registry);
        }
    }
}
