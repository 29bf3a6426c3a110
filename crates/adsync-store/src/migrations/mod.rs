//! Schema migrations, tracked with `PRAGMA user_version`.
//!
//! Each entry in [`MIGRATIONS`] is applied at most once, in order, every time
//! a [`Database`](crate::Database) is opened.

pub mod v001_initial;
pub mod v002_retired_source_ids;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type Migration = (&'static str, fn(&Connection) -> rusqlite::Result<()>);

/// Append only. The position of an entry is its schema version minus one.
const MIGRATIONS: &[Migration] = &[
    ("v001_initial", v001_initial::up),
    ("v002_retired_source_ids", v002_retired_source_ids::up),
];

pub const CURRENT_VERSION: u32 = MIGRATIONS.len() as u32;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema v{current} is newer than supported v{CURRENT_VERSION}"
        )));
    }

    tracing::info!(
        current_version = current,
        target_version = CURRENT_VERSION,
        "checking database migrations"
    );

    for (version, (name, up)) in (1u32..).zip(MIGRATIONS) {
        if version <= current {
            continue;
        }
        tracing::info!(migration = name, "applying migration");
        up(conn).map_err(|e| StoreError::Migration(format!("{name}: {e}")))?;
        conn.pragma_update(None, "user_version", version)?;
    }

    Ok(())
}
