//! Commitment derivation engine
//!
//! Turns the set of accepted claims into per-member giving/receiving
//! previews. Derived on every read, never persisted: caching would let
//! the preview drift from the claims it is computed from.
//!
//! Direction rules:
//! - offer claim: the offer's author gives, the claimer receives
//! - desire claim: the claimer gives, the desire's author receives

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::models::{Claim, ClaimStatus, ClaimTarget, Item, ItemKind};

/// One directional pairing produced from an accepted claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitmentEntry {
    pub claim_id: Uuid,
    pub item_kind: ItemKind,
    pub item_title: String,
    pub item_details: Option<String>,
    /// The member on the other side of this pairing
    pub counterpart_membership_id: Uuid,
    pub note: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Everything one member is giving and receiving
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberCommitments {
    pub giving: Vec<CommitmentEntry>,
    pub receiving: Vec<CommitmentEntry>,
}

impl MemberCommitments {
    /// Gate for per-member export actions
    pub fn has_any(&self) -> bool {
        !self.giving.is_empty() || !self.receiving.is_empty()
    }
}

/// Commitments keyed by membership id. BTreeMap so iteration order is
/// stable across identical inputs.
pub type CommitmentMap = BTreeMap<Uuid, MemberCommitments>;

/// Derive the full commitment map for a room.
///
/// Deterministic and side-effect free: accepted claims are processed in
/// ascending creation order, entries within each list keep that order,
/// and a claim whose item has vanished is skipped rather than failing
/// the whole read.
pub fn derive_commitments(offers: &[Item], desires: &[Item], claims: &[Claim]) -> CommitmentMap {
    let offers_by_id: HashMap<Uuid, &Item> = offers.iter().map(|i| (i.id, i)).collect();
    let desires_by_id: HashMap<Uuid, &Item> = desires.iter().map(|i| (i.id, i)).collect();

    let mut accepted: Vec<&Claim> = claims
        .iter()
        .filter(|c| c.status == ClaimStatus::Accepted)
        .collect();
    accepted.sort_by_key(|c| (c.created_at, c.id));

    let mut map = CommitmentMap::new();

    for claim in accepted {
        let (item, giver, receiver) = match claim.target {
            ClaimTarget::Offer(offer_id) => match offers_by_id.get(&offer_id) {
                Some(offer) => (*offer, offer.author_membership_id, claim.claimer_membership_id),
                None => {
                    warn!(claim_id = %claim.id, %offer_id, "skipping claim with dangling offer");
                    continue;
                }
            },
            ClaimTarget::Desire(desire_id) => match desires_by_id.get(&desire_id) {
                Some(desire) => {
                    (*desire, claim.claimer_membership_id, desire.author_membership_id)
                }
                None => {
                    warn!(claim_id = %claim.id, %desire_id, "skipping claim with dangling desire");
                    continue;
                }
            },
        };

        map.entry(giver)
            .or_default()
            .giving
            .push(entry(claim, item, receiver));
        map.entry(receiver)
            .or_default()
            .receiving
            .push(entry(claim, item, giver));
    }

    map
}

fn entry(claim: &Claim, item: &Item, counterpart: Uuid) -> CommitmentEntry {
    CommitmentEntry {
        claim_id: claim.id,
        item_kind: item.kind,
        item_title: item.title.clone(),
        item_details: item.details.clone(),
        counterpart_membership_id: counterpart,
        note: claim.note.clone(),
        updated_at: claim.updated_at,
    }
}
