//! Server-side document store.
//!
//! Two logical collections (`users` and `orders`) plus the session table
//! and the append-only order-history list, all held in one rusqlite
//! database. The [`Db`] struct owns the connection and guarantees that
//! migrations run before any other operation; typed CRUD helpers live in
//! the per-collection modules.

pub mod orders;
pub mod sessions;
pub mod users;

use std::path::Path;

use rusqlite::Connection;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// An embedded JSON document failed to (de)serialize.
    #[error("Stored document is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),
}

/// Convenience alias used throughout the store modules.
pub type Result<T> = std::result::Result<T, DbError>;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Db {
    conn: Connection,
}

impl Db {
    /// Open (or create) the database at `path` and run migrations.
    pub fn open_at(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "opening database");

        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// In-memory database, used by tests.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        // Recommended SQLite settings.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        run_migrations(&conn)?;

        Ok(Self { conn })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    ///
    /// Callers should prefer the typed CRUD helpers; direct access is
    /// occasionally needed for ad-hoc queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Current schema version. Bump this and extend [`run_migrations`] whenever
/// the schema changes.
const CURRENT_VERSION: u32 = 1;

/// SQL executed when upgrading from version 0 to version 1.
const V001_UP: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,       -- stored lowercased
    password_hash TEXT NOT NULL,              -- Argon2id PHC string
    phone_number  TEXT,
    created_at    TEXT NOT NULL,              -- ISO-8601 / RFC-3339
    last_login    TEXT
);

-- ----------------------------------------------------------------
-- Orders
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS orders (
    order_id           TEXT PRIMARY KEY NOT NULL,
    user_id            TEXT,                      -- nullable: NULL = guest order
    items              TEXT NOT NULL,             -- JSON array of order lines
    shipping_address   TEXT NOT NULL,             -- JSON document
    subtotal           REAL NOT NULL,
    shipping_cost      REAL NOT NULL,
    total              REAL NOT NULL,
    payment_method     TEXT NOT NULL,
    payment_status     TEXT NOT NULL,
    order_status       TEXT NOT NULL,
    payment_reference  TEXT,
    notes              TEXT,
    estimated_delivery TEXT,
    tracking_number    TEXT,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_orders_user_created
    ON orders(user_id, created_at DESC);

-- ----------------------------------------------------------------
-- Order history: linking an order to a user is a single INSERT,
-- so concurrent linkage never loses an append.
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS order_history (
    user_id    TEXT NOT NULL,
    order_id   TEXT NOT NULL,
    created_at TEXT NOT NULL,

    PRIMARY KEY (user_id, order_id),
    FOREIGN KEY (user_id)  REFERENCES users(id)         ON DELETE CASCADE,
    FOREIGN KEY (order_id) REFERENCES orders(order_id)  ON DELETE CASCADE
);

-- ----------------------------------------------------------------
-- Sessions
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY NOT NULL,  -- blake3 of the bearer token
    user_id    TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_expiry ON sessions(expires_at);
"#;

/// Run all pending migrations, guarded by `PRAGMA user_version`.
fn run_migrations(conn: &Connection) -> Result<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    tracing::debug!(
        current_version = current,
        target_version = CURRENT_VERSION,
        "checking database migrations"
    );

    if current < 1 {
        tracing::info!("applying migration v001 (initial schema)");
        conn.execute_batch(V001_UP)
            .map_err(|e| DbError::Migration(e.to_string()))?;
        conn.pragma_update(None, "user_version", 1)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let db = Db::open_in_memory().unwrap();
        run_migrations(db.conn()).unwrap();

        let version: u32 = db
            .conn()
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }
}
