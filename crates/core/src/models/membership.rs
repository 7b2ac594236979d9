//! Membership and role models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rounds::Round;

/// Roles within a room. Exactly one membership per room carries `Host`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MemberRole {
    /// Standard participant
    Participant = 1,
    /// Opened the circle; the only member who may advance the round
    Host = 2,
}

impl MemberRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            MemberRole::Host => "Host",
            MemberRole::Participant => "Participant",
        }
    }

    pub fn is_host(&self) -> bool {
        *self == MemberRole::Host
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A user's participation record in one room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub display_name: String,
    pub nickname: Option<String>,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
    /// Free-text reflection shared during the Summary round
    pub enjoyment: Option<String>,
    /// Set to the round the member has signalled they are done with;
    /// cleared when toggled off. Readers compare it against the room's
    /// current round, so stale markers from earlier rounds are inert.
    pub ready_for_round: Option<Round>,
}

impl Membership {
    pub fn new(room_id: Uuid, user_id: Uuid, display_name: String, role: MemberRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            user_id,
            display_name,
            nickname: None,
            role,
            joined_at: Utc::now(),
            enjoyment: None,
            ready_for_round: None,
        }
    }

    pub fn with_nickname(mut self, nickname: String) -> Self {
        self.nickname = Some(nickname);
        self
    }

    /// Whether this member has signalled completion of the given round
    pub fn is_ready_for(&self, round: Round) -> bool {
        self.ready_for_round == Some(round)
    }
}
