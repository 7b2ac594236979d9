//! Database migration system
//!
//! Tracks schema versions and applies migrations in order.

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::Result;

/// A database migration
pub struct Migration {
    /// Version number (must be sequential starting from 1)
    pub version: u32,
    /// Description of what this migration does
    pub description: &'static str,
    /// SQL to run for this migration
    pub sql: &'static str,
}

/// All migrations in order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: r#"
            -- Rooms table: one row per circle
            CREATE TABLE IF NOT EXISTS rooms (
                id TEXT PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                title TEXT NOT NULL,
                host_user_id TEXT NOT NULL,
                current_round INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- Memberships table
            CREATE TABLE IF NOT EXISTS memberships (
                id TEXT PRIMARY KEY,
                room_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                display_name TEXT NOT NULL,
                nickname TEXT,
                role INTEGER NOT NULL,
                joined_at TEXT NOT NULL,
                enjoyment TEXT,
                ready_for_round INTEGER,
                FOREIGN KEY (room_id) REFERENCES rooms(id) ON DELETE CASCADE,
                UNIQUE(room_id, user_id)
            );

            -- Items table: offers and desires share one table, split by kind
            CREATE TABLE IF NOT EXISTS items (
                id TEXT PRIMARY KEY,
                room_id TEXT NOT NULL,
                author_membership_id TEXT NOT NULL,
                -- offer | desire
                kind TEXT NOT NULL,
                title TEXT NOT NULL,
                details TEXT,
                -- open | fulfilled | withdrawn
                status TEXT NOT NULL DEFAULT 'open',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (room_id) REFERENCES rooms(id) ON DELETE CASCADE,
                FOREIGN KEY (author_membership_id) REFERENCES memberships(id)
            );

            -- Claims table: exactly one of offer_id/desire_id is set
            CREATE TABLE IF NOT EXISTS claims (
                id TEXT PRIMARY KEY,
                room_id TEXT NOT NULL,
                claimer_membership_id TEXT NOT NULL,
                offer_id TEXT,
                desire_id TEXT,
                -- pending | accepted | declined | withdrawn
                status TEXT NOT NULL DEFAULT 'pending',
                note TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                CHECK ((offer_id IS NULL) != (desire_id IS NULL)),
                FOREIGN KEY (room_id) REFERENCES rooms(id) ON DELETE CASCADE,
                FOREIGN KEY (claimer_membership_id) REFERENCES memberships(id),
                FOREIGN KEY (offer_id) REFERENCES items(id),
                FOREIGN KEY (desire_id) REFERENCES items(id)
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add indexes for query performance",
        sql: r#"
            CREATE INDEX IF NOT EXISTS idx_rooms_code ON rooms(code);

            CREATE INDEX IF NOT EXISTS idx_memberships_room ON memberships(room_id);
            CREATE INDEX IF NOT EXISTS idx_memberships_user ON memberships(user_id);

            CREATE INDEX IF NOT EXISTS idx_items_room ON items(room_id);
            CREATE INDEX IF NOT EXISTS idx_items_room_kind_created
                ON items(room_id, kind, created_at);

            CREATE INDEX IF NOT EXISTS idx_claims_room_created ON claims(room_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_claims_offer ON claims(offer_id);
            CREATE INDEX IF NOT EXISTS idx_claims_desire ON claims(desire_id);
        "#,
    },
    Migration {
        version: 3,
        description: "Enforce one pending claim per claimer per target",
        sql: r#"
            -- Partial unique indexes back the duplicate-claim rule at the
            -- persistence boundary: two concurrent creates by the same
            -- claimer on the same target cannot both insert a pending row.
            CREATE UNIQUE INDEX IF NOT EXISTS idx_claims_pending_per_offer
                ON claims(claimer_membership_id, offer_id)
                WHERE status = 'pending' AND offer_id IS NOT NULL;

            CREATE UNIQUE INDEX IF NOT EXISTS idx_claims_pending_per_desire
                ON claims(claimer_membership_id, desire_id)
                WHERE status = 'pending' AND desire_id IS NOT NULL;
        "#,
    },
];

/// Initialize the migrations table
fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version
fn get_current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .unwrap_or(None);
    Ok(version.unwrap_or(0))
}

/// Record that a migration was applied
fn record_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.version,
            migration.description,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Run all pending migrations
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    init_migrations_table(conn)?;

    let current_version = get_current_version(conn)?;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                description = migration.description,
                "Applying migration"
            );

            conn.execute_batch(migration.sql)?;
            record_migration(conn, migration)?;
        }
    }

    let new_version = get_current_version(conn)?;
    if new_version > current_version {
        info!(
            from = current_version,
            to = new_version,
            "Database schema updated"
        );
    }

    Ok(())
}
