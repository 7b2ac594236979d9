//! Room event types and the pub-sub collaborator seam
//!
//! The service publishes events through `EventSink`; delivery (realtime
//! transport, fan-out, presence) lives outside this crate.

use uuid::Uuid;

use crate::models::{ClaimStatus, ItemKind};
use crate::rounds::Round;

/// Events emitted by room mutations
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    MemberJoined {
        room_id: Uuid,
        membership_id: Uuid,
    },
    ItemCreated {
        room_id: Uuid,
        item_id: Uuid,
        kind: ItemKind,
    },
    ItemUpdated {
        room_id: Uuid,
        item_id: Uuid,
        kind: ItemKind,
    },
    ClaimCreated {
        room_id: Uuid,
        claim_id: Uuid,
    },
    ClaimUpdated {
        room_id: Uuid,
        claim_id: Uuid,
        status: ClaimStatus,
    },
    RoundAdvanced {
        room_id: Uuid,
        round: Round,
    },
    ReadyChanged {
        room_id: Uuid,
        membership_id: Uuid,
        ready_for_round: Option<Round>,
    },
}

impl RoomEvent {
    /// Wire topic for transport collaborators
    pub fn topic(&self) -> &'static str {
        match self {
            RoomEvent::MemberJoined { .. } => "member:joined",
            RoomEvent::ItemCreated { .. } => "item:created",
            RoomEvent::ItemUpdated { .. } => "item:updated",
            RoomEvent::ClaimCreated { .. } => "claim:created",
            RoomEvent::ClaimUpdated { .. } => "claim:updated",
            RoomEvent::RoundAdvanced { .. } => "room:advanced",
            RoomEvent::ReadyChanged { .. } => "member:ready",
        }
    }

    pub fn room_id(&self) -> Uuid {
        match self {
            RoomEvent::MemberJoined { room_id, .. }
            | RoomEvent::ItemCreated { room_id, .. }
            | RoomEvent::ItemUpdated { room_id, .. }
            | RoomEvent::ClaimCreated { room_id, .. }
            | RoomEvent::ClaimUpdated { room_id, .. }
            | RoomEvent::RoundAdvanced { room_id, .. }
            | RoomEvent::ReadyChanged { room_id, .. } => *room_id,
        }
    }
}

/// Collaborator that delivers room events to interested parties
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &RoomEvent);
}

/// Sink that drops everything - the default when no transport is wired
pub struct NullSink;

impl EventSink for NullSink {
    fn publish(&self, _event: &RoomEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topics() {
        let room_id = Uuid::new_v4();
        let event = RoomEvent::ClaimCreated {
            room_id,
            claim_id: Uuid::new_v4(),
        };
        assert_eq!(event.topic(), "claim:created");
        assert_eq!(event.room_id(), room_id);

        let event = RoomEvent::ClaimUpdated {
            room_id,
            claim_id: Uuid::new_v4(),
            status: ClaimStatus::Accepted,
        };
        assert_eq!(event.topic(), "claim:updated");
    }
}
