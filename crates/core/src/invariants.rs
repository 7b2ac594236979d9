//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use uuid::Uuid;

use crate::models::{Claim, MemberRole, Membership, Room};

/// Validate that a room's state is internally consistent
pub fn assert_room_invariants(room: &Room) {
    debug_assert!(
        !room.title.trim().is_empty(),
        "Room {} has empty title",
        room.id
    );

    debug_assert!(
        !room.code.trim().is_empty(),
        "Room {} has empty join code",
        room.id
    );
}

/// Validate that a membership is valid
pub fn assert_membership_invariants(membership: &Membership) {
    debug_assert!(
        membership.user_id != Uuid::nil(),
        "Membership {} has nil user_id",
        membership.id
    );

    debug_assert!(
        membership.room_id != Uuid::nil(),
        "Membership {} has nil room_id",
        membership.id
    );
}

/// Validate that a room's member list is consistent
pub fn assert_member_list_invariants(members: &[Membership]) {
    let host_count = members
        .iter()
        .filter(|m| m.role == MemberRole::Host)
        .count();
    debug_assert!(
        host_count <= 1,
        "Member list has {} hosts, expected 0 or 1",
        host_count
    );
}

/// Validate that a claim references sane ids
pub fn assert_claim_invariants(claim: &Claim) {
    debug_assert!(
        claim.claimer_membership_id != Uuid::nil(),
        "Claim {} has nil claimer",
        claim.id
    );

    debug_assert!(
        claim.target.item_id() != Uuid::nil(),
        "Claim {} targets a nil item",
        claim.id
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClaimTarget;

    #[test]
    fn test_valid_room() {
        let room = Room::new("Test circle".to_string(), Uuid::new_v4());
        assert_room_invariants(&room);
    }

    #[test]
    fn test_valid_membership() {
        let membership = Membership::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "ana".to_string(),
            MemberRole::Participant,
        );
        assert_membership_invariants(&membership);
    }

    #[test]
    fn test_single_host_list() {
        let room_id = Uuid::new_v4();
        let members = vec![
            Membership::new(room_id, Uuid::new_v4(), "h".to_string(), MemberRole::Host),
            Membership::new(
                room_id,
                Uuid::new_v4(),
                "p".to_string(),
                MemberRole::Participant,
            ),
        ];
        assert_member_list_invariants(&members);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "hosts")]
    fn test_two_hosts_detected() {
        let room_id = Uuid::new_v4();
        let members = vec![
            Membership::new(room_id, Uuid::new_v4(), "a".to_string(), MemberRole::Host),
            Membership::new(room_id, Uuid::new_v4(), "b".to_string(), MemberRole::Host),
        ];
        assert_member_list_invariants(&members);
    }

    #[test]
    fn test_valid_claim() {
        let claim = Claim::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            ClaimTarget::Offer(Uuid::new_v4()),
        );
        assert_claim_invariants(&claim);
    }
}
