//! Claim model - a bid against another member's item

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::ItemKind;

/// Lifecycle status of a claim. `Pending` is the only live state;
/// the other three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Pending,
    Accepted,
    Declined,
    Withdrawn,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Accepted => "accepted",
            ClaimStatus::Declined => "declined",
            ClaimStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn parse(s: &str) -> Option<ClaimStatus> {
        match s {
            "pending" => Some(ClaimStatus::Pending),
            "accepted" => Some(ClaimStatus::Accepted),
            "declined" => Some(ClaimStatus::Declined),
            "withdrawn" => Some(ClaimStatus::Withdrawn),
            _ => None,
        }
    }

    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        *self != ClaimStatus::Pending
    }
}

/// The decision an item author takes on a pending claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimDecision {
    Accepted,
    Declined,
}

impl From<ClaimDecision> for ClaimStatus {
    fn from(decision: ClaimDecision) -> Self {
        match decision {
            ClaimDecision::Accepted => ClaimStatus::Accepted,
            ClaimDecision::Declined => ClaimStatus::Declined,
        }
    }
}

/// What a claim points at: exactly one offer or exactly one desire.
///
/// The persisted row keeps two nullable columns; in memory this is a
/// tagged variant so "both set" and "neither set" are unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "item_id", rename_all = "lowercase")]
pub enum ClaimTarget {
    Offer(Uuid),
    Desire(Uuid),
}

impl ClaimTarget {
    /// Build a target from the two-column wire/row shape.
    /// Fails when both or neither id is set.
    pub fn from_ids(offer_id: Option<Uuid>, desire_id: Option<Uuid>) -> Result<ClaimTarget> {
        match (offer_id, desire_id) {
            (Some(id), None) => Ok(ClaimTarget::Offer(id)),
            (None, Some(id)) => Ok(ClaimTarget::Desire(id)),
            (Some(_), Some(_)) => Err(Error::Validation(
                "a claim must target an offer or a desire, not both".to_string(),
            )),
            (None, None) => Err(Error::Validation(
                "a claim must target an offer or a desire".to_string(),
            )),
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            ClaimTarget::Offer(_) => ItemKind::Offer,
            ClaimTarget::Desire(_) => ItemKind::Desire,
        }
    }

    /// The id of the targeted item, whichever kind it is
    pub fn item_id(&self) -> Uuid {
        match self {
            ClaimTarget::Offer(id) | ClaimTarget::Desire(id) => *id,
        }
    }

    pub fn offer_id(&self) -> Option<Uuid> {
        match self {
            ClaimTarget::Offer(id) => Some(*id),
            ClaimTarget::Desire(_) => None,
        }
    }

    pub fn desire_id(&self) -> Option<Uuid> {
        match self {
            ClaimTarget::Desire(id) => Some(*id),
            ClaimTarget::Offer(_) => None,
        }
    }
}

/// A bid by one member against another member's item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: Uuid,
    pub room_id: Uuid,
    pub claimer_membership_id: Uuid,
    pub target: ClaimTarget,
    pub status: ClaimStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    pub fn new(room_id: Uuid, claimer_membership_id: Uuid, target: ClaimTarget) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            room_id,
            claimer_membership_id,
            target,
            status: ClaimStatus::Pending,
            note: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.note = Some(note);
        self
    }
}
