//! Room service - the transport-agnostic operation surface
//!
//! Implements the mutations and reads callers perform against a room.
//! Each operation loads fresh state, applies the pure rules from
//! `rounds`/`claims`, persists through the repository traits, and
//! publishes events through the sink. Status transitions and round
//! advances persist with a compare-and-swap so concurrent writers
//! cannot both succeed.

use std::collections::HashSet;

use tracing::instrument;
use uuid::Uuid;

use crate::claims;
use crate::error::{Error, Result};
use crate::events::{EventSink, NullSink, RoomEvent};
use crate::invariants::{
    assert_claim_invariants, assert_membership_invariants, assert_room_invariants,
};
use crate::models::{
    Claim, ClaimDecision, ClaimStatus, ClaimTarget, Item, ItemKind, ItemStatus, MemberRole,
    Membership, Room,
};
use crate::rounds::Round;
use crate::snapshot::{build_snapshot, RoomSnapshot};
use crate::storage::Storage;

const MAX_TITLE_LEN: usize = 120;
const MAX_TEXT_LEN: usize = 2000;
const CODE_RETRIES: usize = 5;

/// Partial update for an item. `None` fields are left untouched.
#[derive(Debug, Default, Clone)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub details: Option<String>,
    pub status: Option<ItemStatus>,
}

/// The core operation surface over a storage backend and an event sink
pub struct RoomService<S: Storage, E: EventSink = NullSink> {
    storage: S,
    events: E,
}

impl<S: Storage> RoomService<S, NullSink> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            events: NullSink,
        }
    }
}

impl<S: Storage, E: EventSink> RoomService<S, E> {
    pub fn with_events(storage: S, events: E) -> Self {
        Self { storage, events }
    }

    // --- rooms and membership ---

    /// Open a new circle. The creator becomes the host member.
    #[instrument(skip(self, host_display_name, title))]
    pub fn create_room(
        &self,
        host_user_id: Uuid,
        host_display_name: &str,
        title: &str,
    ) -> Result<(Room, Membership)> {
        validate_title(title)?;
        validate_name(host_display_name)?;

        let mut room = Room::new(title.to_string(), host_user_id);
        // Regenerate on the rare code collision
        for _ in 0..CODE_RETRIES {
            if self.storage.find_room_by_code(&room.code)?.is_none() {
                break;
            }
            room.code = Room::generate_code();
        }
        assert_room_invariants(&room);
        self.storage
            .create_room(&room)
            .map_err(|e| map_constraint(e, "join code already in use"))?;

        let membership = Membership::new(
            room.id,
            host_user_id,
            host_display_name.to_string(),
            MemberRole::Host,
        );
        assert_membership_invariants(&membership);
        self.storage.add_membership(&membership)?;

        self.events.publish(&RoomEvent::MemberJoined {
            room_id: room.id,
            membership_id: membership.id,
        });

        Ok((room, membership))
    }

    /// Join a circle by its code. Idempotent per user and room: a
    /// returning user gets their existing membership back.
    #[instrument(skip(self, display_name))]
    pub fn join_room(
        &self,
        code: &str,
        user_id: Uuid,
        display_name: &str,
    ) -> Result<(Room, Membership)> {
        let room = self
            .storage
            .find_room_by_code(code)?
            .ok_or_else(|| Error::NotFound(format!("no room with code {code}")))?;

        if let Some(existing) = self.storage.find_membership_for_user(room.id, user_id)? {
            return Ok((room, existing));
        }

        validate_name(display_name)?;
        let membership = Membership::new(
            room.id,
            user_id,
            display_name.to_string(),
            MemberRole::Participant,
        );
        self.storage
            .add_membership(&membership)
            .map_err(|e| map_constraint(e, "already a member of this room"))?;

        self.events.publish(&RoomEvent::MemberJoined {
            room_id: room.id,
            membership_id: membership.id,
        });

        Ok((room, membership))
    }

    /// Update a member's nickname and/or enjoyment reflection.
    /// Passing an empty string clears the field.
    #[instrument(skip(self, nickname, enjoyment))]
    pub fn update_profile(
        &self,
        room_id: Uuid,
        membership_id: Uuid,
        nickname: Option<String>,
        enjoyment: Option<String>,
    ) -> Result<Membership> {
        let mut membership = self.load_member_in_room(room_id, membership_id)?;

        if let Some(nickname) = nickname {
            validate_text(&nickname, "nickname", MAX_TITLE_LEN)?;
            membership.nickname = non_empty(nickname);
        }
        if let Some(enjoyment) = enjoyment {
            validate_text(&enjoyment, "enjoyment", MAX_TEXT_LEN)?;
            membership.enjoyment = non_empty(enjoyment);
        }

        self.storage.update_membership(&membership)?;
        Ok(membership)
    }

    /// Mark (or unmark) a member as done with the current round
    #[instrument(skip(self))]
    pub fn toggle_ready(
        &self,
        room_id: Uuid,
        membership_id: Uuid,
        ready: bool,
    ) -> Result<Option<Round>> {
        let room = self.load_room(room_id)?;
        let mut membership = self.load_member_in_room(room_id, membership_id)?;

        membership.ready_for_round = ready.then_some(room.current_round);
        self.storage.update_membership(&membership)?;

        self.events.publish(&RoomEvent::ReadyChanged {
            room_id,
            membership_id,
            ready_for_round: membership.ready_for_round,
        });

        Ok(membership.ready_for_round)
    }

    /// Move the room to the next round. Host only, one step at a time.
    #[instrument(skip(self, active_membership_ids))]
    pub fn advance_round(
        &self,
        room_id: Uuid,
        requester_membership_id: Uuid,
        active_membership_ids: &HashSet<Uuid>,
    ) -> Result<RoomSnapshot> {
        let room = self.load_room(room_id)?;
        let requester = self.load_member_in_room(room_id, requester_membership_id)?;

        if requester.role != MemberRole::Host {
            return Err(Error::Authorization(
                "only the host may advance the round".to_string(),
            ));
        }

        let next = room.current_round.next().ok_or_else(|| {
            Error::InvalidState("the circle is already at its final round".to_string())
        })?;

        if !self.storage.advance_room(room_id, room.current_round, next)? {
            return Err(Error::Conflict(
                "the round was advanced by someone else, refresh and retry".to_string(),
            ));
        }

        self.events.publish(&RoomEvent::RoundAdvanced {
            room_id,
            round: next,
        });

        self.get_snapshot(room_id, active_membership_ids)
    }

    // --- items ---

    /// Post a new offer or desire
    #[instrument(skip(self, title, details))]
    pub fn create_item(
        &self,
        kind: ItemKind,
        room_id: Uuid,
        author_membership_id: Uuid,
        title: &str,
        details: Option<String>,
    ) -> Result<Item> {
        self.load_room(room_id)?;
        let author = self.load_member_in_room(room_id, author_membership_id)?;

        validate_title(title)?;
        let mut item = Item::new(room_id, author.id, kind, title.to_string());
        if let Some(details) = details {
            validate_text(&details, "details", MAX_TEXT_LEN)?;
            if let Some(details) = non_empty(details) {
                item = item.with_details(details);
            }
        }

        self.storage.create_item(&item)?;
        self.events.publish(&RoomEvent::ItemCreated {
            room_id,
            item_id: item.id,
            kind,
        });

        Ok(item)
    }

    /// Edit an item. Author only.
    #[instrument(skip(self, patch))]
    pub fn update_item(
        &self,
        kind: ItemKind,
        item_id: Uuid,
        author_membership_id: Uuid,
        patch: ItemPatch,
    ) -> Result<Item> {
        let mut item = self.load_item(item_id, kind)?;
        ensure_author(&item, author_membership_id)?;

        if let Some(title) = patch.title {
            validate_title(&title)?;
            item.title = title;
        }
        if let Some(details) = patch.details {
            validate_text(&details, "details", MAX_TEXT_LEN)?;
            item.details = non_empty(details);
        }
        if let Some(status) = patch.status {
            item.status = status;
        }
        item.updated_at = chrono::Utc::now();

        self.storage.update_item(&item)?;
        self.events.publish(&RoomEvent::ItemUpdated {
            room_id: item.room_id,
            item_id: item.id,
            kind,
        });

        Ok(item)
    }

    /// Withdraw an item. Author only; idempotent; soft - the row stays
    /// for claims that already reference it.
    #[instrument(skip(self))]
    pub fn delete_item(
        &self,
        kind: ItemKind,
        item_id: Uuid,
        author_membership_id: Uuid,
    ) -> Result<()> {
        let mut item = self.load_item(item_id, kind)?;
        ensure_author(&item, author_membership_id)?;

        if item.status == ItemStatus::Withdrawn {
            return Ok(());
        }

        item.status = ItemStatus::Withdrawn;
        item.updated_at = chrono::Utc::now();
        self.storage.update_item(&item)?;
        self.events.publish(&RoomEvent::ItemUpdated {
            room_id: item.room_id,
            item_id: item.id,
            kind,
        });

        Ok(())
    }

    // --- claims ---

    /// Place a claim on another member's item. Exactly one of
    /// `offer_id`/`desire_id` must be set.
    #[instrument(skip(self, note))]
    pub fn create_claim(
        &self,
        room_id: Uuid,
        claimer_membership_id: Uuid,
        offer_id: Option<Uuid>,
        desire_id: Option<Uuid>,
        note: Option<String>,
    ) -> Result<Claim> {
        let target = ClaimTarget::from_ids(offer_id, desire_id)?;

        self.load_room(room_id)?;
        let claimer = self.load_member_in_room(room_id, claimer_membership_id)?;
        let item = self.load_item(target.item_id(), target.kind())?;
        if item.room_id != room_id {
            return Err(Error::NotFound(
                "the claimed item belongs to another room".to_string(),
            ));
        }

        let existing = self.storage.list_claims_for_item(item.id)?;
        claims::validate_create(&item, claimer.id, &existing)?;

        let mut claim = Claim::new(room_id, claimer.id, target);
        if let Some(note) = note {
            validate_text(&note, "note", MAX_TEXT_LEN)?;
            if let Some(note) = non_empty(note) {
                claim = claim.with_note(note);
            }
        }

        assert_claim_invariants(&claim);
        // The pending-claim index catches the duplicate race the pure
        // check cannot see
        self.storage
            .create_claim(&claim)
            .map_err(|e| map_constraint(e, "you already have a pending claim on this item"))?;

        self.events.publish(&RoomEvent::ClaimCreated {
            room_id,
            claim_id: claim.id,
        });

        Ok(claim)
    }

    /// Accept or decline a claim. Only the claimed item's author decides.
    #[instrument(skip(self))]
    pub fn decide_claim(
        &self,
        claim_id: Uuid,
        decider_membership_id: Uuid,
        decision: ClaimDecision,
    ) -> Result<Claim> {
        let claim = self.load_claim(claim_id)?;
        let item = self.load_target_item(&claim)?;
        claims::authorize_decide(&claim, &item, decider_membership_id)?;

        self.transition(claim, decision.into())
    }

    /// Withdraw a pending claim. Claimer only.
    #[instrument(skip(self))]
    pub fn withdraw_claim(&self, claim_id: Uuid, requester_membership_id: Uuid) -> Result<Claim> {
        let claim = self.load_claim(claim_id)?;
        claims::authorize_withdraw(&claim, requester_membership_id)?;

        self.transition(claim, ClaimStatus::Withdrawn)
    }

    fn transition(&self, claim: Claim, to: ClaimStatus) -> Result<Claim> {
        if !self.storage.transition_claim(claim.id, to)? {
            // Lost a race: someone else decided or withdrew first
            return Err(Error::InvalidState(
                "the claim is no longer pending, refresh and retry".to_string(),
            ));
        }

        let updated = self.load_claim(claim.id)?;
        self.events.publish(&RoomEvent::ClaimUpdated {
            room_id: updated.room_id,
            claim_id: updated.id,
            status: updated.status,
        });

        Ok(updated)
    }

    // --- reads ---

    /// Assemble the full read-model for a room. `active_membership_ids`
    /// comes from the realtime presence collaborator and only annotates.
    #[instrument(skip(self, active_membership_ids))]
    pub fn get_snapshot(
        &self,
        room_id: Uuid,
        active_membership_ids: &HashSet<Uuid>,
    ) -> Result<RoomSnapshot> {
        let room = self.load_room(room_id)?;
        let memberships = self.storage.list_memberships(room_id)?;
        let offers = self.storage.list_items(room_id, ItemKind::Offer)?;
        let desires = self.storage.list_items(room_id, ItemKind::Desire)?;
        let claims = self.storage.list_claims_for_room(room_id)?;

        Ok(build_snapshot(
            &room,
            &memberships,
            &offers,
            &desires,
            &claims,
            active_membership_ids,
        ))
    }

    // --- loading helpers ---

    fn load_room(&self, room_id: Uuid) -> Result<Room> {
        self.storage
            .find_room_by_id(room_id)?
            .ok_or_else(|| Error::NotFound(format!("room {room_id} does not exist")))
    }

    fn load_member_in_room(&self, room_id: Uuid, membership_id: Uuid) -> Result<Membership> {
        let membership = self
            .storage
            .find_membership_by_id(membership_id)?
            .ok_or_else(|| Error::NotFound(format!("membership {membership_id} does not exist")))?;

        if membership.room_id != room_id {
            return Err(Error::Authorization(
                "membership does not belong to this room".to_string(),
            ));
        }
        Ok(membership)
    }

    fn load_item(&self, item_id: Uuid, kind: ItemKind) -> Result<Item> {
        let item = self
            .storage
            .find_item_by_id(item_id)?
            .filter(|i| i.kind == kind)
            .ok_or_else(|| Error::NotFound(format!("no {kind} with id {item_id}")))?;
        Ok(item)
    }

    fn load_claim(&self, claim_id: Uuid) -> Result<Claim> {
        self.storage
            .find_claim_by_id(claim_id)?
            .ok_or_else(|| Error::NotFound(format!("claim {claim_id} does not exist")))
    }

    fn load_target_item(&self, claim: &Claim) -> Result<Item> {
        self.load_item(claim.target.item_id(), claim.target.kind())
            .map_err(|_| Error::NotFound("the claimed item no longer exists".to_string()))
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::Validation("title must not be empty".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(Error::Validation(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation(
            "display name must not be empty".to_string(),
        ));
    }
    if name.chars().count() > MAX_TITLE_LEN {
        return Err(Error::Validation(format!(
            "display name must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_text(text: &str, field: &str, limit: usize) -> Result<()> {
    if text.chars().count() > limit {
        return Err(Error::Validation(format!(
            "{field} must be at most {limit} characters"
        )));
    }
    Ok(())
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn ensure_author(item: &Item, membership_id: Uuid) -> Result<()> {
    if item.author_membership_id != membership_id {
        return Err(Error::Authorization(
            "only the author may change this item".to_string(),
        ));
    }
    Ok(())
}

fn map_constraint(err: Error, message: &str) -> Error {
    match err {
        Error::Database(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Error::Conflict(message.to_string())
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use std::sync::Mutex;

    /// Sink that records everything it sees (test double)
    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<RoomEvent>>,
    }

    impl EventSink for RecordingSink {
        fn publish(&self, event: &RoomEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    struct Circle {
        service: RoomService<Database>,
        room: Room,
        host: Membership,
        guest: Membership,
    }

    fn circle() -> Circle {
        let service = RoomService::new(Database::open_in_memory().unwrap());
        let (room, host) = service
            .create_room(Uuid::new_v4(), "hana", "Solstice circle")
            .unwrap();
        let (_, guest) = service
            .join_room(&room.code, Uuid::new_v4(), "piotr")
            .unwrap();
        Circle {
            service,
            room,
            host,
            guest,
        }
    }

    fn no_presence() -> HashSet<Uuid> {
        HashSet::new()
    }

    #[test]
    fn test_create_and_join() {
        let c = circle();
        assert_eq!(c.host.role, MemberRole::Host);
        assert_eq!(c.guest.role, MemberRole::Participant);

        // Joining again returns the existing membership
        let (_, again) = c
            .service
            .join_room(&c.room.code, c.guest.user_id, "piotr renamed")
            .unwrap();
        assert_eq!(again.id, c.guest.id);
        assert_eq!(again.display_name, "piotr");

        assert!(matches!(
            c.service.join_room("XXXXXX", Uuid::new_v4(), "nobody"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_empty_or_overlong_titles_rejected() {
        let c = circle();
        assert!(matches!(
            c.service
                .create_item(ItemKind::Offer, c.room.id, c.host.id, "   ", None),
            Err(Error::Validation(_))
        ));

        let long = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(matches!(
            c.service
                .create_item(ItemKind::Offer, c.room.id, c.host.id, &long, None),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_only_author_edits_item() {
        let c = circle();
        let item = c
            .service
            .create_item(ItemKind::Offer, c.room.id, c.host.id, "bread", None)
            .unwrap();

        let patch = ItemPatch {
            title: Some("rye bread".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            c.service
                .update_item(ItemKind::Offer, item.id, c.guest.id, patch.clone()),
            Err(Error::Authorization(_))
        ));

        let updated = c
            .service
            .update_item(ItemKind::Offer, item.id, c.host.id, patch)
            .unwrap();
        assert_eq!(updated.title, "rye bread");
    }

    #[test]
    fn test_delete_item_is_soft_and_idempotent() {
        let c = circle();
        let item = c
            .service
            .create_item(ItemKind::Offer, c.room.id, c.host.id, "bread", None)
            .unwrap();

        c.service
            .delete_item(ItemKind::Offer, item.id, c.host.id)
            .unwrap();
        c.service
            .delete_item(ItemKind::Offer, item.id, c.host.id)
            .unwrap();

        // Withdrawn items reject new claims
        assert!(matches!(
            c.service
                .create_claim(c.room.id, c.guest.id, Some(item.id), None, None),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_claim_target_exclusivity() {
        let c = circle();
        let offer = c
            .service
            .create_item(ItemKind::Offer, c.room.id, c.host.id, "bread", None)
            .unwrap();
        let desire = c
            .service
            .create_item(ItemKind::Desire, c.room.id, c.host.id, "a song", None)
            .unwrap();

        assert!(matches!(
            c.service
                .create_claim(c.room.id, c.guest.id, Some(offer.id), Some(desire.id), None),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            c.service.create_claim(c.room.id, c.guest.id, None, None, None),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_self_claim_rejected() {
        let c = circle();
        let offer = c
            .service
            .create_item(ItemKind::Offer, c.room.id, c.host.id, "bread", None)
            .unwrap();

        assert!(matches!(
            c.service
                .create_claim(c.room.id, c.host.id, Some(offer.id), None, None),
            Err(Error::Authorization(_))
        ));
    }

    #[test]
    fn test_duplicate_pending_claim_rejected() {
        let c = circle();
        let offer = c
            .service
            .create_item(ItemKind::Offer, c.room.id, c.host.id, "bread", None)
            .unwrap();

        c.service
            .create_claim(c.room.id, c.guest.id, Some(offer.id), None, None)
            .unwrap();
        assert!(matches!(
            c.service
                .create_claim(c.room.id, c.guest.id, Some(offer.id), None, None),
            Err(Error::Conflict(_))
        ));
    }

    #[test]
    fn test_decision_authority_and_terminal_immutability() {
        let c = circle();
        let offer = c
            .service
            .create_item(ItemKind::Offer, c.room.id, c.host.id, "bread", None)
            .unwrap();
        let claim = c
            .service
            .create_claim(c.room.id, c.guest.id, Some(offer.id), None, None)
            .unwrap();

        // The claimer is not the decider
        assert!(matches!(
            c.service
                .decide_claim(claim.id, c.guest.id, ClaimDecision::Accepted),
            Err(Error::Authorization(_))
        ));

        let accepted = c
            .service
            .decide_claim(claim.id, c.host.id, ClaimDecision::Accepted)
            .unwrap();
        assert_eq!(accepted.status, ClaimStatus::Accepted);

        // Second decision fails and leaves the claim untouched
        assert!(matches!(
            c.service
                .decide_claim(claim.id, c.host.id, ClaimDecision::Declined),
            Err(Error::InvalidState(_))
        ));
        assert!(matches!(
            c.service.withdraw_claim(claim.id, c.guest.id),
            Err(Error::InvalidState(_))
        ));

        let snapshot = c.service.get_snapshot(c.room.id, &no_presence()).unwrap();
        let reloaded = snapshot.claims.iter().find(|x| x.id == claim.id).unwrap();
        assert_eq!(reloaded.status, ClaimStatus::Accepted);
        assert_eq!(reloaded.updated_at, accepted.updated_at);
    }

    #[test]
    fn test_withdraw_is_claimer_only() {
        let c = circle();
        let offer = c
            .service
            .create_item(ItemKind::Offer, c.room.id, c.host.id, "bread", None)
            .unwrap();
        let claim = c
            .service
            .create_claim(c.room.id, c.guest.id, Some(offer.id), None, None)
            .unwrap();

        assert!(matches!(
            c.service.withdraw_claim(claim.id, c.host.id),
            Err(Error::Authorization(_))
        ));

        let withdrawn = c.service.withdraw_claim(claim.id, c.guest.id).unwrap();
        assert_eq!(withdrawn.status, ClaimStatus::Withdrawn);

        // A withdrawn claim can no longer be decided
        assert!(matches!(
            c.service
                .decide_claim(claim.id, c.host.id, ClaimDecision::Accepted),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn test_accepting_one_claim_leaves_siblings_pending() {
        let c = circle();
        let (_, second_guest) = c
            .service
            .join_room(&c.room.code, Uuid::new_v4(), "quinn")
            .unwrap();

        let offer = c
            .service
            .create_item(ItemKind::Offer, c.room.id, c.host.id, "bread", None)
            .unwrap();
        let first = c
            .service
            .create_claim(c.room.id, c.guest.id, Some(offer.id), None, None)
            .unwrap();
        let second = c
            .service
            .create_claim(c.room.id, second_guest.id, Some(offer.id), None, None)
            .unwrap();

        c.service
            .decide_claim(first.id, c.host.id, ClaimDecision::Accepted)
            .unwrap();

        // No cascade: the sibling stays pending and the item stays open
        let snapshot = c.service.get_snapshot(c.room.id, &no_presence()).unwrap();
        let sibling = snapshot.claims.iter().find(|x| x.id == second.id).unwrap();
        assert_eq!(sibling.status, ClaimStatus::Pending);
        assert_eq!(snapshot.offers[0].status, ItemStatus::Open);
    }

    #[test]
    fn test_round_advance_is_host_only_forward_and_terminal() {
        let c = circle();

        assert!(matches!(
            c.service.advance_round(c.room.id, c.guest.id, &no_presence()),
            Err(Error::Authorization(_))
        ));

        let mut expected = Round::Waiting;
        while let Some(next) = expected.next() {
            let snapshot = c
                .service
                .advance_round(c.room.id, c.host.id, &no_presence())
                .unwrap();
            assert_eq!(snapshot.current_round, next);
            expected = next;
        }
        assert_eq!(expected, Round::Summary);

        // Advancing past the final round always fails
        assert!(matches!(
            c.service.advance_round(c.room.id, c.host.id, &no_presence()),
            Err(Error::InvalidState(_))
        ));

        // Scenario D: all prior rounds are complete, Summary is active
        let snapshot = c.service.get_snapshot(c.room.id, &no_presence()).unwrap();
        assert!(snapshot.rounds[5].is_active);
        assert!(snapshot.rounds[..5].iter().all(|r| r.is_complete));
    }

    #[test]
    fn test_accepted_offer_claim_shows_in_commitments() {
        // Scenario A: host offers, guest claims, host accepts
        let c = circle();
        let offer = c
            .service
            .create_item(
                ItemKind::Offer,
                c.room.id,
                c.host.id,
                "sourdough loaf",
                Some("every Sunday".to_string()),
            )
            .unwrap();
        let claim = c
            .service
            .create_claim(
                c.room.id,
                c.guest.id,
                Some(offer.id),
                None,
                Some("yes please".to_string()),
            )
            .unwrap();
        c.service
            .decide_claim(claim.id, c.host.id, ClaimDecision::Accepted)
            .unwrap();

        let snapshot = c.service.get_snapshot(c.room.id, &no_presence()).unwrap();

        let host_side = &snapshot.commitments[&c.host.id];
        assert_eq!(host_side.giving.len(), 1);
        assert_eq!(host_side.giving[0].item_title, "sourdough loaf");
        assert_eq!(host_side.giving[0].counterpart_membership_id, c.guest.id);
        assert!(host_side.has_any());

        let guest_side = &snapshot.commitments[&c.guest.id];
        assert_eq!(guest_side.receiving.len(), 1);
        assert_eq!(guest_side.receiving[0].counterpart_membership_id, c.host.id);
        assert_eq!(guest_side.receiving[0].note.as_deref(), Some("yes please"));
    }

    #[test]
    fn test_declined_desire_claim_derives_nothing() {
        // Scenario B
        let c = circle();
        let desire = c
            .service
            .create_item(ItemKind::Desire, c.room.id, c.host.id, "bike repair", None)
            .unwrap();
        let claim = c
            .service
            .create_claim(c.room.id, c.guest.id, None, Some(desire.id), None)
            .unwrap();
        c.service
            .decide_claim(claim.id, c.host.id, ClaimDecision::Declined)
            .unwrap();

        let snapshot = c.service.get_snapshot(c.room.id, &no_presence()).unwrap();
        assert!(snapshot.commitments.is_empty());
    }

    #[test]
    fn test_toggle_ready_tracks_current_round() {
        let c = circle();
        c.service
            .advance_round(c.room.id, c.host.id, &no_presence())
            .unwrap();

        let marker = c.service.toggle_ready(c.room.id, c.guest.id, true).unwrap();
        assert_eq!(marker, Some(Round::Offers));

        let snapshot = c.service.get_snapshot(c.room.id, &no_presence()).unwrap();
        let guest = snapshot
            .members
            .iter()
            .find(|m| m.membership_id == c.guest.id)
            .unwrap();
        assert!(guest.is_ready);

        let marker = c
            .service
            .toggle_ready(c.room.id, c.guest.id, false)
            .unwrap();
        assert_eq!(marker, None);
    }

    #[test]
    fn test_update_profile() {
        let c = circle();
        let updated = c
            .service
            .update_profile(
                c.room.id,
                c.guest.id,
                Some("pio".to_string()),
                Some("loved the decisions round".to_string()),
            )
            .unwrap();
        assert_eq!(updated.nickname.as_deref(), Some("pio"));

        // Empty string clears the field
        let cleared = c
            .service
            .update_profile(c.room.id, c.guest.id, Some("".to_string()), None)
            .unwrap();
        assert_eq!(cleared.nickname, None);
        assert_eq!(
            cleared.enjoyment.as_deref(),
            Some("loved the decisions round")
        );
    }

    #[test]
    fn test_presence_annotates_snapshot() {
        let c = circle();
        let active: HashSet<Uuid> = [c.host.id].into_iter().collect();

        let snapshot = c.service.get_snapshot(c.room.id, &active).unwrap();
        assert_eq!(snapshot.members.len(), 2);
        let host = &snapshot.members[0];
        assert!(host.is_host && host.is_active);
        let guest = &snapshot.members[1];
        assert!(!guest.is_active);
    }

    #[test]
    fn test_events_are_published() {
        let service =
            RoomService::with_events(Database::open_in_memory().unwrap(), RecordingSink::default());
        let (room, host) = service
            .create_room(Uuid::new_v4(), "hana", "Event circle")
            .unwrap();
        let (_, guest) = service
            .join_room(&room.code, Uuid::new_v4(), "piotr")
            .unwrap();

        let offer = service
            .create_item(ItemKind::Offer, room.id, host.id, "bread", None)
            .unwrap();
        let claim = service
            .create_claim(room.id, guest.id, Some(offer.id), None, None)
            .unwrap();
        service
            .decide_claim(claim.id, host.id, ClaimDecision::Accepted)
            .unwrap();

        let topics: Vec<&'static str> = service
            .events
            .events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.topic())
            .collect();
        assert_eq!(
            topics,
            vec![
                "member:joined",
                "member:joined",
                "item:created",
                "claim:created",
                "claim:updated",
            ]
        );
    }

    #[test]
    fn test_membership_must_match_room() {
        let c = circle();
        let (other_room, _) = c
            .service
            .create_room(Uuid::new_v4(), "zoe", "Other circle")
            .unwrap();

        assert!(matches!(
            c.service
                .create_item(ItemKind::Offer, other_room.id, c.guest.id, "bread", None),
            Err(Error::Authorization(_))
        ));
    }
}
