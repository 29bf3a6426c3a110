//! v001 -- Initial schema creation.
//!
//! Creates the `ad_records` table.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS ad_records (
    id                     TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    source_id              TEXT NOT NULL UNIQUE,       -- marketplace correlation key
    vehicle_id             TEXT,
    owner_id               TEXT NOT NULL,
    category_id            INTEGER NOT NULL,
    title                  TEXT NOT NULL,
    body                   TEXT NOT NULL,
    price                  REAL NOT NULL,
    remote_ad_id           TEXT,
    secondary_remote_ad_id TEXT,
    remote_state           TEXT,
    last_action            TEXT,                       -- create | update | bump | delete
    action_state           TEXT,                       -- processing | done | error
    error_message          TEXT,
    created_at             TEXT NOT NULL,              -- RFC-3339
    updated_at             TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ad_records_owner
    ON ad_records(owner_id, created_at DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
