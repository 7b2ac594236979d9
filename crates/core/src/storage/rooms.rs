//! Room storage operations

use rusqlite::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_uuid, round_from_u8, OptionalExt};
use crate::error::Result;
use crate::models::Room;
use crate::rounds::Round;

pub struct RoomStore<'a> {
    conn: &'a Connection,
}

impl<'a> RoomStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new room
    #[instrument(skip(self, room), fields(room_id = %room.id, code = %room.code))]
    pub fn create(&self, room: &Room) -> Result<()> {
        self.conn.execute(
            "INSERT INTO rooms (id, code, title, host_user_id, current_round, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                room.id.to_string(),
                room.code,
                room.title,
                room.host_user_id.to_string(),
                room.current_round as u8,
                room.created_at.to_rfc3339(),
                room.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find room by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Room>> {
        self.query_one("id = ?1", &id.to_string())
    }

    /// Find room by join code
    #[instrument(skip(self))]
    pub fn find_by_code(&self, code: &str) -> Result<Option<Room>> {
        self.query_one("code = ?1", code)
    }

    fn query_one(&self, predicate: &str, param: &str) -> Result<Option<Room>> {
        let sql = format!(
            "SELECT id, code, title, host_user_id, current_round, created_at, updated_at
             FROM rooms WHERE {predicate}"
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let room = stmt
            .query_row(params![param], |row| {
                Ok(Room {
                    id: parse_uuid(&row.get::<_, String>(0)?)?,
                    code: row.get(1)?,
                    title: row.get(2)?,
                    host_user_id: parse_uuid(&row.get::<_, String>(3)?)?,
                    current_round: round_from_u8(row.get::<_, u8>(4)?),
                    created_at: parse_datetime(&row.get::<_, String>(5)?)?,
                    updated_at: parse_datetime(&row.get::<_, String>(6)?)?,
                })
            })
            .optional()?;

        Ok(room)
    }

    /// Update room title
    #[instrument(skip(self, room), fields(room_id = %room.id))]
    pub fn update(&self, room: &Room) -> Result<()> {
        self.conn.execute(
            "UPDATE rooms SET title = ?1, updated_at = ?2 WHERE id = ?3",
            params![
                room.title,
                chrono::Utc::now().to_rfc3339(),
                room.id.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Advance the round with a compare-and-swap against the observed
    /// round. Returns `false` when another writer moved the round first.
    #[instrument(skip(self))]
    pub fn advance(&self, room_id: Uuid, from: Round, to: Round) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE rooms SET current_round = ?1, updated_at = ?2
             WHERE id = ?3 AND current_round = ?4",
            params![
                to as u8,
                chrono::Utc::now().to_rfc3339(),
                room_id.to_string(),
                from as u8,
            ],
        )?;
        Ok(changed == 1)
    }

    /// Delete a room (cascades to memberships, items, claims)
    #[instrument(skip(self))]
    pub fn delete(&self, room_id: Uuid) -> Result<()> {
        self.conn.execute(
            "DELETE FROM rooms WHERE id = ?1",
            params![room_id.to_string()],
        )?;
        Ok(())
    }
}
