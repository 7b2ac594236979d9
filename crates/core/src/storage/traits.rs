//! Storage repository traits
//!
//! These traits define the storage interface, allowing for different
//! implementations (SQLite, mock, future network backend). The service
//! depends on these rather than on a concrete client.

use uuid::Uuid;

use crate::error::Result;
use crate::models::{Claim, ClaimStatus, Item, ItemKind, Membership, Room};
use crate::rounds::Round;

/// Room repository operations
pub trait RoomRepository {
    /// Create a new room
    fn create_room(&self, room: &Room) -> Result<()>;

    /// Find room by ID
    fn find_room_by_id(&self, id: Uuid) -> Result<Option<Room>>;

    /// Find room by join code
    fn find_room_by_code(&self, code: &str) -> Result<Option<Room>>;

    /// Update room metadata
    fn update_room(&self, room: &Room) -> Result<()>;

    /// Compare-and-swap round advance; `false` means the round moved
    /// under this caller
    fn advance_room(&self, room_id: Uuid, from: Round, to: Round) -> Result<bool>;
}

/// Membership repository operations
pub trait MembershipRepository {
    /// Add a membership
    fn add_membership(&self, membership: &Membership) -> Result<()>;

    /// Find membership by ID
    fn find_membership_by_id(&self, id: Uuid) -> Result<Option<Membership>>;

    /// Find a user's membership in a room
    fn find_membership_for_user(&self, room_id: Uuid, user_id: Uuid)
        -> Result<Option<Membership>>;

    /// List a room's memberships in join order
    fn list_memberships(&self, room_id: Uuid) -> Result<Vec<Membership>>;

    /// Write back mutable membership fields
    fn update_membership(&self, membership: &Membership) -> Result<()>;
}

/// Item repository operations
pub trait ItemRepository {
    /// Create a new item
    fn create_item(&self, item: &Item) -> Result<()>;

    /// Find item by ID
    fn find_item_by_id(&self, id: Uuid) -> Result<Option<Item>>;

    /// List a room's items of one kind in creation order
    fn list_items(&self, room_id: Uuid, kind: ItemKind) -> Result<Vec<Item>>;

    /// Write back mutable item fields
    fn update_item(&self, item: &Item) -> Result<()>;
}

/// Claim repository operations
pub trait ClaimRepository {
    /// Create a new claim
    fn create_claim(&self, claim: &Claim) -> Result<()>;

    /// Find claim by ID
    fn find_claim_by_id(&self, id: Uuid) -> Result<Option<Claim>>;

    /// List a room's claims in creation order
    fn list_claims_for_room(&self, room_id: Uuid) -> Result<Vec<Claim>>;

    /// List the claims placed on one item
    fn list_claims_for_item(&self, item_id: Uuid) -> Result<Vec<Claim>>;

    /// Compare-and-swap status transition out of `Pending`; `false`
    /// means this caller lost the race
    fn transition_claim(&self, claim_id: Uuid, to: ClaimStatus) -> Result<bool>;
}

/// Combined storage interface
///
/// Provides access to all repository operations.
/// Implementations may be backed by SQLite, mocks, or network.
pub trait Storage:
    RoomRepository + MembershipRepository + ItemRepository + ClaimRepository
{
}

// Blanket implementation: any type implementing all traits implements Storage
impl<T> Storage for T where
    T: RoomRepository + MembershipRepository + ItemRepository + ClaimRepository
{
}
