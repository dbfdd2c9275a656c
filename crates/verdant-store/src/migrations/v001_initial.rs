//! v001 -- Initial schema creation.
//!
//! One table: `kv_store`. Every persisted client value (cart, mirrored
//! profile, credential) is a single row keyed by its storage key.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key            TEXT PRIMARY KEY NOT NULL,  -- namespaced storage key
    value          TEXT NOT NULL,              -- JSON or plain text payload
    schema_version INTEGER NOT NULL,           -- version of the value layout
    updated_at     TEXT NOT NULL               -- ISO-8601 / RFC-3339
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
