//! SQLite storage layer for Kula

mod claims;
mod items;
mod memberships;
mod migrations;
mod parse;
mod rooms;
mod traits;

use rusqlite::Connection;
use std::path::Path;
use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Claim, ClaimStatus, Item, ItemKind, Membership, Room};
use crate::rounds::Round;

pub use claims::ClaimStore;
pub use items::ItemStore;
pub use memberships::MembershipStore;
pub use rooms::RoomStore;
pub use traits::{
    ClaimRepository, ItemRepository, MembershipRepository, RoomRepository, Storage,
};

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap_or(0)
    }

    /// Get room store
    pub fn rooms(&self) -> RoomStore<'_> {
        RoomStore::new(&self.conn)
    }

    /// Get membership store
    pub fn memberships(&self) -> MembershipStore<'_> {
        MembershipStore::new(&self.conn)
    }

    /// Get item store
    pub fn items(&self) -> ItemStore<'_> {
        ItemStore::new(&self.conn)
    }

    /// Get claim store
    pub fn claims(&self) -> ClaimStore<'_> {
        ClaimStore::new(&self.conn)
    }
}

// Implement repository traits for Database
// This enables using Database through the trait interface

impl RoomRepository for Database {
    fn create_room(&self, room: &Room) -> Result<()> {
        self.rooms().create(room)
    }

    fn find_room_by_id(&self, id: Uuid) -> Result<Option<Room>> {
        self.rooms().find_by_id(id)
    }

    fn find_room_by_code(&self, code: &str) -> Result<Option<Room>> {
        self.rooms().find_by_code(code)
    }

    fn update_room(&self, room: &Room) -> Result<()> {
        self.rooms().update(room)
    }

    fn advance_room(&self, room_id: Uuid, from: Round, to: Round) -> Result<bool> {
        self.rooms().advance(room_id, from, to)
    }
}

impl MembershipRepository for Database {
    fn add_membership(&self, membership: &Membership) -> Result<()> {
        self.memberships().create(membership)
    }

    fn find_membership_by_id(&self, id: Uuid) -> Result<Option<Membership>> {
        self.memberships().find_by_id(id)
    }

    fn find_membership_for_user(
        &self,
        room_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Membership>> {
        self.memberships().find_for_user(room_id, user_id)
    }

    fn list_memberships(&self, room_id: Uuid) -> Result<Vec<Membership>> {
        self.memberships().list_for_room(room_id)
    }

    fn update_membership(&self, membership: &Membership) -> Result<()> {
        self.memberships().update(membership)
    }
}

impl ItemRepository for Database {
    fn create_item(&self, item: &Item) -> Result<()> {
        self.items().create(item)
    }

    fn find_item_by_id(&self, id: Uuid) -> Result<Option<Item>> {
        self.items().find_by_id(id)
    }

    fn list_items(&self, room_id: Uuid, kind: ItemKind) -> Result<Vec<Item>> {
        self.items().list_for_room(room_id, kind)
    }

    fn update_item(&self, item: &Item) -> Result<()> {
        self.items().update(item)
    }
}

impl ClaimRepository for Database {
    fn create_claim(&self, claim: &Claim) -> Result<()> {
        self.claims().create(claim)
    }

    fn find_claim_by_id(&self, id: Uuid) -> Result<Option<Claim>> {
        self.claims().find_by_id(id)
    }

    fn list_claims_for_room(&self, room_id: Uuid) -> Result<Vec<Claim>> {
        self.claims().list_for_room(room_id)
    }

    fn list_claims_for_item(&self, item_id: Uuid) -> Result<Vec<Claim>> {
        self.claims().list_for_item(item_id)
    }

    fn transition_claim(&self, claim_id: Uuid, to: ClaimStatus) -> Result<bool> {
        self.claims().transition(claim_id, to)
    }
}
