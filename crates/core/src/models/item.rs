//! Item models - offers and desires

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of item this is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Something a member proposes to give
    Offer,
    /// Something a member would like to receive
    Desire,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Offer => "offer",
            ItemKind::Desire => "desire",
        }
    }

    pub fn parse(s: &str) -> Option<ItemKind> {
        match s {
            "offer" => Some(ItemKind::Offer),
            "desire" => Some(ItemKind::Desire),
            _ => None,
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Open,
    Fulfilled,
    Withdrawn,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Open => "open",
            ItemStatus::Fulfilled => "fulfilled",
            ItemStatus::Withdrawn => "withdrawn",
        }
    }

    pub fn parse(s: &str) -> Option<ItemStatus> {
        match s {
            "open" => Some(ItemStatus::Open),
            "fulfilled" => Some(ItemStatus::Fulfilled),
            "withdrawn" => Some(ItemStatus::Withdrawn),
            _ => None,
        }
    }

    pub fn is_open(&self) -> bool {
        *self == ItemStatus::Open
    }
}

/// An offer or desire authored by one member.
///
/// Items are never hard-deleted while claims reference them; withdrawal
/// is a status change so decided claims keep their audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub room_id: Uuid,
    pub author_membership_id: Uuid,
    pub kind: ItemKind,
    pub title: String,
    pub details: Option<String>,
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn new(room_id: Uuid, author_membership_id: Uuid, kind: ItemKind, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            room_id,
            author_membership_id,
            kind,
            title,
            details: None,
            status: ItemStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_details(mut self, details: String) -> Self {
        self.details = Some(details);
        self
    }
}

/// The standard "things I can claim" view: open items authored by others
pub fn open_items_excluding_author(items: &[Item], membership_id: Uuid) -> Vec<&Item> {
    items
        .iter()
        .filter(|i| i.status.is_open() && i.author_membership_id != membership_id)
        .collect()
}
