//! Item storage operations (offers and desires)

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_item_kind, parse_item_status, parse_uuid, OptionalExt};
use crate::error::Result;
use crate::models::{Item, ItemKind};

pub struct ItemStore<'a> {
    conn: &'a Connection,
}

const COLUMNS: &str =
    "id, room_id, author_membership_id, kind, title, details, status, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        room_id: parse_uuid(&row.get::<_, String>(1)?)?,
        author_membership_id: parse_uuid(&row.get::<_, String>(2)?)?,
        kind: parse_item_kind(&row.get::<_, String>(3)?)?,
        title: row.get(4)?,
        details: row.get(5)?,
        status: parse_item_status(&row.get::<_, String>(6)?)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?)?,
        updated_at: parse_datetime(&row.get::<_, String>(8)?)?,
    })
}

impl<'a> ItemStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new item
    #[instrument(skip(self, item), fields(item_id = %item.id, kind = %item.kind))]
    pub fn create(&self, item: &Item) -> Result<()> {
        self.conn.execute(
            "INSERT INTO items
                 (id, room_id, author_membership_id, kind, title, details, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                item.id.to_string(),
                item.room_id.to_string(),
                item.author_membership_id.to_string(),
                item.kind.as_str(),
                item.title,
                item.details,
                item.status.as_str(),
                item.created_at.to_rfc3339(),
                item.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find item by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Item>> {
        let sql = format!("SELECT {COLUMNS} FROM items WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let item = stmt
            .query_row(params![id.to_string()], from_row)
            .optional()?;
        Ok(item)
    }

    /// List a room's items of one kind in creation order
    #[instrument(skip(self))]
    pub fn list_for_room(&self, room_id: Uuid, kind: ItemKind) -> Result<Vec<Item>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM items
             WHERE room_id = ?1 AND kind = ?2
             ORDER BY created_at, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let items = stmt
            .query_map(params![room_id.to_string(), kind.as_str()], from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Write back the mutable item fields
    #[instrument(skip(self, item), fields(item_id = %item.id))]
    pub fn update(&self, item: &Item) -> Result<()> {
        self.conn.execute(
            "UPDATE items SET title = ?1, details = ?2, status = ?3, updated_at = ?4
             WHERE id = ?5",
            params![
                item.title,
                item.details,
                item.status.as_str(),
                item.updated_at.to_rfc3339(),
                item.id.to_string(),
            ],
        )?;
        Ok(())
    }
}
