//! Database value parsing utilities
//!
//! Provides error-safe parsing of stored values.

use chrono::{DateTime, Utc};
use rusqlite::Error as SqlError;
use uuid::Uuid;

use crate::models::{ClaimStatus, ClaimTarget, ItemKind, ItemStatus, MemberRole};
use crate::rounds::Round;

/// Parse a UUID from a database string column
pub fn parse_uuid(s: &str) -> Result<Uuid, SqlError> {
    Uuid::parse_str(s).map_err(|e| {
        SqlError::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Parse an optional UUID from a database string column
pub fn parse_uuid_opt(s: Option<String>) -> Result<Option<Uuid>, SqlError> {
    s.map(|s| parse_uuid(&s)).transpose()
}

/// Parse a DateTime from an RFC3339 string
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, SqlError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            SqlError::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// Convert a u8 to a Round
pub fn round_from_u8(value: u8) -> Round {
    match value {
        1 => Round::Offers,
        2 => Round::Desires,
        3 => Round::Connections,
        4 => Round::Decisions,
        5 => Round::Summary,
        _ => Round::Waiting,
    }
}

/// Convert an optional u8 column to an optional Round
pub fn round_from_u8_opt(value: Option<u8>) -> Option<Round> {
    value.map(round_from_u8)
}

/// Convert a u8 to a MemberRole
pub fn role_from_u8(value: u8) -> MemberRole {
    match value {
        2 => MemberRole::Host,
        _ => MemberRole::Participant,
    }
}

/// Parse an item kind from its text column
pub fn parse_item_kind(s: &str) -> Result<ItemKind, SqlError> {
    ItemKind::parse(s).ok_or_else(|| conversion_failure(format!("unknown item kind: {s}")))
}

/// Parse an item status from its text column
pub fn parse_item_status(s: &str) -> Result<ItemStatus, SqlError> {
    ItemStatus::parse(s).ok_or_else(|| conversion_failure(format!("unknown item status: {s}")))
}

/// Parse a claim status from its text column
pub fn parse_claim_status(s: &str) -> Result<ClaimStatus, SqlError> {
    ClaimStatus::parse(s).ok_or_else(|| conversion_failure(format!("unknown claim status: {s}")))
}

/// Build a claim target from the two nullable target columns.
/// The schema CHECK guarantees exactly one is set; a row violating
/// that is surfaced as a conversion failure rather than a panic.
pub fn parse_claim_target(
    offer_id: Option<String>,
    desire_id: Option<String>,
) -> Result<ClaimTarget, SqlError> {
    let offer_id = parse_uuid_opt(offer_id)?;
    let desire_id = parse_uuid_opt(desire_id)?;
    ClaimTarget::from_ids(offer_id, desire_id)
        .map_err(|e| conversion_failure(format!("invalid claim target columns: {e}")))
}

fn conversion_failure(message: String) -> SqlError {
    SqlError::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::<dyn std::error::Error + Send + Sync>::from(message),
    )
}

/// Extension trait for converting rusqlite Results to Option
pub trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, SqlError>;
}

impl<T> OptionalExt<T> for Result<T, SqlError> {
    fn optional(self) -> Result<Option<T>, SqlError> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(SqlError::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_round_trip() {
        for round in Round::sequence() {
            assert_eq!(round_from_u8(*round as u8), *round);
        }
        assert_eq!(round_from_u8(99), Round::Waiting);
    }

    #[test]
    fn test_claim_target_columns() {
        let id = Uuid::new_v4();
        let target = parse_claim_target(Some(id.to_string()), None).unwrap();
        assert_eq!(target, ClaimTarget::Offer(id));

        let target = parse_claim_target(None, Some(id.to_string())).unwrap();
        assert_eq!(target, ClaimTarget::Desire(id));

        assert!(parse_claim_target(None, None).is_err());
        assert!(parse_claim_target(Some(id.to_string()), Some(id.to_string())).is_err());
    }

    #[test]
    fn test_status_parsing_rejects_garbage() {
        assert!(parse_claim_status("pending").is_ok());
        assert!(parse_claim_status("maybe").is_err());
        assert!(parse_item_status("open").is_ok());
        assert!(parse_item_kind("desire").is_ok());
        assert!(parse_item_kind("wish").is_err());
    }
}
