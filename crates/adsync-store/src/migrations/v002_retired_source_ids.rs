use rusqlite::Connection;

// Source ids of deleted ads. The marketplace may still hold an ad under one
// of them, so they are never handed out again.
const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS retired_source_ids (
    source_id  TEXT PRIMARY KEY NOT NULL,
    retired_at TEXT NOT NULL
);
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
