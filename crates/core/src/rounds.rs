//! The fixed round sequence and round-gating rules
//!
//! A circle moves through six rounds in a fixed order. The round only
//! advances forward, one step at a time. Gating of member actions to
//! rounds lives here and nowhere else, so UI layers and the service
//! consult a single rule.

use serde::{Deserialize, Serialize};

/// Rounds in circle order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Round {
    /// Gathering - members join and settle in
    Waiting = 0,
    /// Members post what they can give
    Offers = 1,
    /// Members post what they would like to receive
    Desires = 2,
    /// Members place claims on each other's items
    Connections = 3,
    /// Authors accept or decline claims on their items
    Decisions = 4,
    /// The circle closes and commitments are read out
    Summary = 5,
}

/// Static display text for one round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundInfo {
    pub title: &'static str,
    pub description: &'static str,
    pub guidance: &'static str,
}

impl Round {
    /// All rounds in circle order
    pub fn sequence() -> &'static [Round] {
        &[
            Round::Waiting,
            Round::Offers,
            Round::Desires,
            Round::Connections,
            Round::Decisions,
            Round::Summary,
        ]
    }

    /// Zero-based position in the sequence
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// The round that follows this one, or `None` at the end
    pub fn next(&self) -> Option<Round> {
        match self {
            Round::Waiting => Some(Round::Offers),
            Round::Offers => Some(Round::Desires),
            Round::Desires => Some(Round::Connections),
            Round::Connections => Some(Round::Decisions),
            Round::Decisions => Some(Round::Summary),
            Round::Summary => None,
        }
    }

    /// Whether the circle can move on from this round
    pub fn can_advance(&self) -> bool {
        self.next().is_some()
    }

    /// True iff `candidate` is exactly one position after this round
    pub fn is_direct_successor(&self, candidate: Round) -> bool {
        self.next() == Some(candidate)
    }

    pub fn display_name(&self) -> &'static str {
        self.info().title
    }

    /// Display text for this round
    pub fn info(&self) -> RoundInfo {
        match self {
            Round::Waiting => RoundInfo {
                title: "Gathering",
                description: "The circle is forming. Wait for everyone to arrive.",
                guidance: "Introduce yourself and pick a nickname while the host waits \
                           for the circle to fill.",
            },
            Round::Offers => RoundInfo {
                title: "Offers",
                description: "Post the things you can give to the circle.",
                guidance: "Skills, objects, time - anything you would genuinely enjoy \
                           giving. Add details so others know what they are claiming.",
            },
            Round::Desires => RoundInfo {
                title: "Desires",
                description: "Post the things you would like to receive.",
                guidance: "Be concrete. A clear desire is easier for someone else to \
                           step up and fulfil.",
            },
            Round::Connections => RoundInfo {
                title: "Connections",
                description: "Claim offers you want and desires you can fulfil.",
                guidance: "Browse everyone else's items and place claims. A short note \
                           with your claim helps the author decide.",
            },
            Round::Decisions => RoundInfo {
                title: "Decisions",
                description: "Accept or decline the claims on your items.",
                guidance: "Only you decide the claims on your own items. Accepting a \
                           claim creates a commitment between you and the claimer.",
            },
            Round::Summary => RoundInfo {
                title: "Summary",
                description: "The circle is complete. Review your commitments.",
                guidance: "Read out who is giving what to whom, share what you enjoyed, \
                           and export your personal summary.",
            },
        }
    }

    /// Which round an action naturally belongs to.
    ///
    /// Advisory only: presentation layers use this to steer members, but
    /// the service does not reject late items or claims. The hard rules
    /// (host-only advance, claim legality) live in the service and the
    /// claim state machine.
    pub fn suggests(&self, action: RoomAction) -> bool {
        match action {
            RoomAction::PostOffer => *self == Round::Offers,
            RoomAction::PostDesire => *self == Round::Desires,
            RoomAction::PlaceClaim => *self == Round::Connections,
            RoomAction::DecideClaim => *self == Round::Decisions,
            RoomAction::WithdrawClaim => {
                matches!(self, Round::Connections | Round::Decisions)
            }
            RoomAction::ShareEnjoyment | RoomAction::ExportSummary => *self == Round::Summary,
        }
    }
}

impl std::fmt::Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Member actions subject to round guidance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomAction {
    PostOffer,
    PostDesire,
    PlaceClaim,
    DecideClaim,
    WithdrawClaim,
    ShareEnjoyment,
    ExportSummary,
}
