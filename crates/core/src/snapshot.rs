//! Room snapshot builder
//!
//! Assembles the full read-model a client needs to render a room:
//! round metadata, the sorted roster with live presence, sorted items
//! and claims, and the derived commitment map. Pure projection - it
//! reads, sorts, and annotates, and is safe to call repeatedly.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::commitments::{derive_commitments, CommitmentMap};
use crate::invariants::assert_member_list_invariants;
use crate::models::{Claim, Item, MemberRole, Membership, Room};
use crate::rounds::Round;

/// One round's position relative to the room's current round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundStatus {
    pub round: Round,
    pub title: String,
    pub description: String,
    pub guidance: String,
    pub is_active: bool,
    /// Strictly before the current round
    pub is_complete: bool,
}

/// A roster entry with live presence annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberView {
    pub membership_id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub nickname: Option<String>,
    pub role: MemberRole,
    pub is_host: bool,
    /// From the realtime presence collaborator. Display-only: an absent
    /// member stays on the roster with `is_active = false`.
    pub is_active: bool,
    pub joined_at: DateTime<Utc>,
    pub enjoyment: Option<String>,
    pub ready_for_round: Option<Round>,
    /// Ready marker matched against the room's current round
    pub is_ready: bool,
}

/// The assembled read-model for one room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room_id: Uuid,
    pub code: String,
    pub title: String,
    pub current_round: Round,
    pub next_round: Option<Round>,
    pub can_advance: bool,
    pub rounds: Vec<RoundStatus>,
    pub members: Vec<MemberView>,
    pub offers: Vec<Item>,
    pub desires: Vec<Item>,
    pub claims: Vec<Claim>,
    pub commitments: CommitmentMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Build the snapshot for one room from its loaded state and the live
/// presence set.
pub fn build_snapshot(
    room: &Room,
    memberships: &[Membership],
    offers: &[Item],
    desires: &[Item],
    claims: &[Claim],
    active_membership_ids: &HashSet<Uuid>,
) -> RoomSnapshot {
    assert_member_list_invariants(memberships);

    // Hosts first, then join order
    let mut roster: Vec<&Membership> = memberships.iter().collect();
    roster.sort_by_key(|m| (m.role != MemberRole::Host, m.joined_at, m.id));

    let members = roster
        .into_iter()
        .map(|m| MemberView {
            membership_id: m.id,
            user_id: m.user_id,
            display_name: m.display_name.clone(),
            nickname: m.nickname.clone(),
            role: m.role,
            is_host: m.role.is_host(),
            is_active: active_membership_ids.contains(&m.id),
            joined_at: m.joined_at,
            enjoyment: m.enjoyment.clone(),
            ready_for_round: m.ready_for_round,
            is_ready: m.is_ready_for(room.current_round),
        })
        .collect();

    let rounds = Round::sequence()
        .iter()
        .map(|&round| {
            let info = round.info();
            RoundStatus {
                round,
                title: info.title.to_string(),
                description: info.description.to_string(),
                guidance: info.guidance.to_string(),
                is_active: round == room.current_round,
                is_complete: round.index() < room.current_round.index(),
            }
        })
        .collect();

    RoomSnapshot {
        room_id: room.id,
        code: room.code.clone(),
        title: room.title.clone(),
        current_round: room.current_round,
        next_round: room.current_round.next(),
        can_advance: room.current_round.can_advance(),
        rounds,
        members,
        offers: sorted_by_creation(offers),
        desires: sorted_by_creation(desires),
        claims: sorted_claims(claims),
        commitments: derive_commitments(offers, desires, claims),
        created_at: room.created_at,
        updated_at: room.updated_at,
    }
}

fn sorted_by_creation(items: &[Item]) -> Vec<Item> {
    let mut items = items.to_vec();
    items.sort_by_key(|i| (i.created_at, i.id));
    items
}

fn sorted_claims(claims: &[Claim]) -> Vec<Claim> {
    let mut claims = claims.to_vec();
    claims.sort_by_key(|c| (c.created_at, c.id));
    claims
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClaimStatus, ClaimTarget, ItemKind};
    use chrono::Duration;

    fn fixture() -> (Room, Vec<Membership>) {
        let host_user = Uuid::new_v4();
        let room = Room::new("Harvest circle".to_string(), host_user);

        let mut host = Membership::new(room.id, host_user, "hana".to_string(), MemberRole::Host);
        host.joined_at = room.created_at;
        let mut early = Membership::new(
            room.id,
            Uuid::new_v4(),
            "piotr".to_string(),
            MemberRole::Participant,
        );
        early.joined_at = room.created_at + Duration::seconds(10);
        let mut late = Membership::new(
            room.id,
            Uuid::new_v4(),
            "quinn".to_string(),
            MemberRole::Participant,
        );
        late.joined_at = room.created_at + Duration::seconds(20);

        // Deliberately out of order
        (room, vec![late, host, early])
    }

    #[test]
    fn test_members_sorted_host_first_then_join_time() {
        let (room, members) = fixture();
        let snapshot = build_snapshot(&room, &members, &[], &[], &[], &HashSet::new());

        let names: Vec<&str> = snapshot
            .members
            .iter()
            .map(|m| m.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["hana", "piotr", "quinn"]);
        assert!(snapshot.members[0].is_host);
    }

    #[test]
    fn test_presence_annotates_and_never_filters() {
        let (room, members) = fixture();
        let active: HashSet<Uuid> = members.iter().take(1).map(|m| m.id).collect();

        let snapshot = build_snapshot(&room, &members, &[], &[], &[], &active);

        assert_eq!(snapshot.members.len(), 3);
        for view in &snapshot.members {
            assert_eq!(view.is_active, active.contains(&view.membership_id));
        }
    }

    #[test]
    fn test_round_flags_track_current_round() {
        let (mut room, members) = fixture();
        room.current_round = Round::Summary;

        let snapshot = build_snapshot(&room, &members, &[], &[], &[], &HashSet::new());

        assert_eq!(snapshot.current_round, Round::Summary);
        assert_eq!(snapshot.next_round, None);
        assert!(!snapshot.can_advance);
        assert_eq!(snapshot.rounds.len(), 6);
        assert!(snapshot.rounds[5].is_active);
        assert!(!snapshot.rounds[5].is_complete);
        for status in &snapshot.rounds[..5] {
            assert!(status.is_complete && !status.is_active);
        }
    }

    #[test]
    fn test_items_and_claims_sorted_by_creation() {
        let (room, members) = fixture();
        let author = members[0].id;
        let claimer = members[1].id;

        let mut older = Item::new(room.id, author, ItemKind::Offer, "first".to_string());
        older.created_at = room.created_at;
        let mut newer = Item::new(room.id, author, ItemKind::Offer, "second".to_string());
        newer.created_at = room.created_at + Duration::seconds(5);

        let mut claim_b = Claim::new(room.id, claimer, ClaimTarget::Offer(newer.id));
        claim_b.created_at = room.created_at + Duration::seconds(9);
        let mut claim_a = Claim::new(room.id, claimer, ClaimTarget::Offer(older.id));
        claim_a.created_at = room.created_at + Duration::seconds(8);

        let snapshot = build_snapshot(
            &room,
            &members,
            &[newer.clone(), older.clone()],
            &[],
            &[claim_b.clone(), claim_a.clone()],
            &HashSet::new(),
        );

        assert_eq!(snapshot.offers[0].id, older.id);
        assert_eq!(snapshot.offers[1].id, newer.id);
        assert_eq!(snapshot.claims[0].id, claim_a.id);
        assert_eq!(snapshot.claims[1].id, claim_b.id);
    }

    #[test]
    fn test_snapshot_is_deterministic() {
        let (room, members) = fixture();
        let author = members[1].id;
        let claimer = members[2].id;

        let offer = Item::new(room.id, author, ItemKind::Offer, "candles".to_string());
        let mut claim = Claim::new(room.id, claimer, ClaimTarget::Offer(offer.id));
        claim.status = ClaimStatus::Accepted;

        let offers = vec![offer];
        let claims = vec![claim];
        let active: HashSet<Uuid> = members.iter().map(|m| m.id).collect();

        let first = build_snapshot(&room, &members, &offers, &[], &claims, &active);
        let second = build_snapshot(&room, &members, &offers, &[], &claims, &active);
        assert_eq!(first, second);

        // Commitment overlay is part of the snapshot
        assert!(first.commitments[&author].has_any());
        assert!(first.commitments[&claimer].has_any());
    }

    #[test]
    fn test_snapshot_serializes() {
        let (room, members) = fixture();
        let snapshot = build_snapshot(&room, &members, &[], &[], &[], &HashSet::new());
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["code"], serde_json::json!(room.code));
        assert_eq!(json["rounds"].as_array().unwrap().len(), 6);
    }
}
