//! Claim state machine
//!
//! Pure legality rules for claim creation, withdrawal, and decisions.
//! The service applies these against freshly loaded state, then persists
//! the transition with a compare-and-swap so a lost race surfaces as an
//! error instead of a double transition.
//!
//! Transitions: `Pending -> Accepted | Declined | Withdrawn`. Nothing
//! leaves a terminal state. Sibling claims on the same item are left
//! untouched when one is accepted, and accepting a claim does not flip
//! the item's status.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{Claim, ClaimStatus, Item};

/// Check whether `claimer` may place a new claim on `item`.
///
/// `existing` must contain the claims already placed on this item.
pub fn validate_create(item: &Item, claimer_membership_id: Uuid, existing: &[Claim]) -> Result<()> {
    if !item.status.is_open() {
        return Err(Error::InvalidState(format!(
            "{} \"{}\" is {}, only open items can be claimed",
            item.kind,
            item.title,
            item.status.as_str()
        )));
    }

    if item.author_membership_id == claimer_membership_id {
        return Err(Error::Authorization(
            "you cannot claim your own item".to_string(),
        ));
    }

    let duplicate = existing.iter().any(|c| {
        c.claimer_membership_id == claimer_membership_id
            && c.target.item_id() == item.id
            && c.status == ClaimStatus::Pending
    });
    if duplicate {
        return Err(Error::Conflict(
            "you already have a pending claim on this item".to_string(),
        ));
    }

    Ok(())
}

/// Check whether `requester` may withdraw `claim`. Only the claimer may
/// withdraw, and only while the claim is pending.
pub fn authorize_withdraw(claim: &Claim, requester_membership_id: Uuid) -> Result<()> {
    if claim.claimer_membership_id != requester_membership_id {
        return Err(Error::Authorization(
            "only the claimer may withdraw their claim".to_string(),
        ));
    }
    ensure_pending(claim)
}

/// Check whether `requester` may decide `claim` against `item`.
///
/// Decision authority always lies with the item's author, never the
/// claimer: a claim is a request directed at that author's item.
pub fn authorize_decide(claim: &Claim, item: &Item, requester_membership_id: Uuid) -> Result<()> {
    debug_assert_eq!(claim.target.item_id(), item.id, "claim/item mismatch");

    if item.author_membership_id != requester_membership_id {
        return Err(Error::Authorization(
            "only the item's author may decide this claim".to_string(),
        ));
    }
    ensure_pending(claim)
}

fn ensure_pending(claim: &Claim) -> Result<()> {
    if claim.status.is_terminal() {
        return Err(Error::InvalidState(format!(
            "claim is already {}",
            claim.status.as_str()
        )));
    }
    Ok(())
}
