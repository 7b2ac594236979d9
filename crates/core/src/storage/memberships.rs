//! Membership storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_uuid, role_from_u8, round_from_u8_opt, OptionalExt};
use crate::error::Result;
use crate::models::Membership;

pub struct MembershipStore<'a> {
    conn: &'a Connection,
}

const COLUMNS: &str =
    "id, room_id, user_id, display_name, nickname, role, joined_at, enjoyment, ready_for_round";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Membership> {
    Ok(Membership {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        room_id: parse_uuid(&row.get::<_, String>(1)?)?,
        user_id: parse_uuid(&row.get::<_, String>(2)?)?,
        display_name: row.get(3)?,
        nickname: row.get(4)?,
        role: role_from_u8(row.get::<_, u8>(5)?),
        joined_at: parse_datetime(&row.get::<_, String>(6)?)?,
        enjoyment: row.get(7)?,
        ready_for_round: round_from_u8_opt(row.get::<_, Option<u8>>(8)?),
    })
}

impl<'a> MembershipStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Add a membership
    #[instrument(skip(self, membership), fields(membership_id = %membership.id, room_id = %membership.room_id))]
    pub fn create(&self, membership: &Membership) -> Result<()> {
        self.conn.execute(
            "INSERT INTO memberships
                 (id, room_id, user_id, display_name, nickname, role, joined_at, enjoyment, ready_for_round)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                membership.id.to_string(),
                membership.room_id.to_string(),
                membership.user_id.to_string(),
                membership.display_name,
                membership.nickname,
                membership.role as u8,
                membership.joined_at.to_rfc3339(),
                membership.enjoyment,
                membership.ready_for_round.map(|r| r as u8),
            ],
        )?;
        Ok(())
    }

    /// Find membership by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Membership>> {
        let sql = format!("SELECT {COLUMNS} FROM memberships WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let membership = stmt
            .query_row(params![id.to_string()], from_row)
            .optional()?;
        Ok(membership)
    }

    /// Find a user's membership in a room
    #[instrument(skip(self))]
    pub fn find_for_user(&self, room_id: Uuid, user_id: Uuid) -> Result<Option<Membership>> {
        let sql = format!("SELECT {COLUMNS} FROM memberships WHERE room_id = ?1 AND user_id = ?2");
        let mut stmt = self.conn.prepare(&sql)?;
        let membership = stmt
            .query_row(params![room_id.to_string(), user_id.to_string()], from_row)
            .optional()?;
        Ok(membership)
    }

    /// List all memberships of a room in join order
    #[instrument(skip(self))]
    pub fn list_for_room(&self, room_id: Uuid) -> Result<Vec<Membership>> {
        let sql =
            format!("SELECT {COLUMNS} FROM memberships WHERE room_id = ?1 ORDER BY joined_at, id");
        let mut stmt = self.conn.prepare(&sql)?;

        let memberships = stmt
            .query_map(params![room_id.to_string()], from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(memberships)
    }

    /// Write back the mutable membership fields
    #[instrument(skip(self, membership), fields(membership_id = %membership.id))]
    pub fn update(&self, membership: &Membership) -> Result<()> {
        self.conn.execute(
            "UPDATE memberships
             SET display_name = ?1, nickname = ?2, enjoyment = ?3, ready_for_round = ?4
             WHERE id = ?5",
            params![
                membership.display_name,
                membership.nickname,
                membership.enjoyment,
                membership.ready_for_round.map(|r| r as u8),
                membership.id.to_string(),
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MemberRole, Room};
    use crate::rounds::Round;
    use crate::storage::Database;

    fn room_with_db() -> (Database, Room) {
        let db = Database::open_in_memory().unwrap();
        let room = Room::new("Test circle".to_string(), Uuid::new_v4());
        db.rooms().create(&room).unwrap();
        (db, room)
    }

    #[test]
    fn test_create_find_update() {
        let (db, room) = room_with_db();
        let mut membership = Membership::new(
            room.id,
            Uuid::new_v4(),
            "ana".to_string(),
            MemberRole::Participant,
        );
        db.memberships().create(&membership).unwrap();

        let found = db
            .memberships()
            .find_for_user(room.id, membership.user_id)
            .unwrap()
            .unwrap();
        assert_eq!(found.display_name, "ana");
        assert_eq!(found.ready_for_round, None);

        membership.nickname = Some("an".to_string());
        membership.ready_for_round = Some(Round::Offers);
        db.memberships().update(&membership).unwrap();

        let reloaded = db.memberships().find_by_id(membership.id).unwrap().unwrap();
        assert_eq!(reloaded.nickname.as_deref(), Some("an"));
        assert_eq!(reloaded.ready_for_round, Some(Round::Offers));
    }

    #[test]
    fn test_one_membership_per_user_per_room() {
        let (db, room) = room_with_db();
        let user = Uuid::new_v4();
        let first = Membership::new(room.id, user, "ana".to_string(), MemberRole::Participant);
        db.memberships().create(&first).unwrap();

        let second = Membership::new(room.id, user, "ana2".to_string(), MemberRole::Participant);
        assert!(db.memberships().create(&second).is_err());
    }

    #[test]
    fn test_list_in_join_order() {
        let (db, room) = room_with_db();
        for name in ["first", "second", "third"] {
            let mut m = Membership::new(
                room.id,
                Uuid::new_v4(),
                name.to_string(),
                MemberRole::Participant,
            );
            m.joined_at = chrono::Utc::now();
            db.memberships().create(&m).unwrap();
        }

        let listed = db.memberships().list_for_room(room.id).unwrap();
        let names: Vec<&str> = listed.iter().map(|m| m.display_name.as_str()).collect();
        assert_eq!(names, vec!["first", "second", "third"]);
    }
}
