//! Claim storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{
    parse_claim_status, parse_claim_target, parse_datetime, parse_uuid, OptionalExt,
};
use crate::error::Result;
use crate::models::{Claim, ClaimStatus};

pub struct ClaimStore<'a> {
    conn: &'a Connection,
}

const COLUMNS: &str =
    "id, room_id, claimer_membership_id, offer_id, desire_id, status, note, created_at, updated_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Claim> {
    Ok(Claim {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        room_id: parse_uuid(&row.get::<_, String>(1)?)?,
        claimer_membership_id: parse_uuid(&row.get::<_, String>(2)?)?,
        target: parse_claim_target(
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
        )?,
        status: parse_claim_status(&row.get::<_, String>(5)?)?,
        note: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?)?,
        updated_at: parse_datetime(&row.get::<_, String>(8)?)?,
    })
}

impl<'a> ClaimStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new claim. The pending-claim unique index makes a
    /// duplicate concurrent insert fail with a constraint violation.
    #[instrument(skip(self, claim), fields(claim_id = %claim.id, room_id = %claim.room_id))]
    pub fn create(&self, claim: &Claim) -> Result<()> {
        self.conn.execute(
            "INSERT INTO claims
                 (id, room_id, claimer_membership_id, offer_id, desire_id, status, note, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                claim.id.to_string(),
                claim.room_id.to_string(),
                claim.claimer_membership_id.to_string(),
                claim.target.offer_id().map(|id| id.to_string()),
                claim.target.desire_id().map(|id| id.to_string()),
                claim.status.as_str(),
                claim.note,
                claim.created_at.to_rfc3339(),
                claim.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find claim by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Claim>> {
        let sql = format!("SELECT {COLUMNS} FROM claims WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql)?;
        let claim = stmt
            .query_row(params![id.to_string()], from_row)
            .optional()?;
        Ok(claim)
    }

    /// List all claims in a room in creation order
    #[instrument(skip(self))]
    pub fn list_for_room(&self, room_id: Uuid) -> Result<Vec<Claim>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM claims WHERE room_id = ?1 ORDER BY created_at, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let claims = stmt
            .query_map(params![room_id.to_string()], from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(claims)
    }

    /// List the claims placed on one item, whichever kind it is
    #[instrument(skip(self))]
    pub fn list_for_item(&self, item_id: Uuid) -> Result<Vec<Claim>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM claims
             WHERE offer_id = ?1 OR desire_id = ?1
             ORDER BY created_at, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;

        let claims = stmt
            .query_map(params![item_id.to_string()], from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(claims)
    }

    /// Move a pending claim into a terminal state with a compare-and-swap
    /// on the prior status. Returns `false` when the claim was no longer
    /// pending, i.e. this caller lost the race.
    #[instrument(skip(self))]
    pub fn transition(&self, claim_id: Uuid, to: ClaimStatus) -> Result<bool> {
        debug_assert!(to.is_terminal(), "transition target must be terminal");

        let changed = self.conn.execute(
            "UPDATE claims SET status = ?1, updated_at = ?2
             WHERE id = ?3 AND status = 'pending'",
            params![
                to.as_str(),
                chrono::Utc::now().to_rfc3339(),
                claim_id.to_string(),
            ],
        )?;
        Ok(changed == 1)
    }
}
