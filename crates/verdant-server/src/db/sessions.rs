//! Bearer-token sessions.
//!
//! Only the blake3 hash of an issued token is stored; presenting a token
//! means hashing it and looking the hash up here.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::db::{Db, DbError, Result};

impl Db {
    /// Record a freshly issued token hash for `user_id`.
    pub fn create_session(
        &self,
        token_hash: &str,
        user_id: Uuid,
        ttl_days: i64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let expires_at = now + Duration::days(ttl_days);
        self.conn().execute(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                token_hash,
                user_id.to_string(),
                now.to_rfc3339(),
                expires_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Resolve a token hash to its user id, ignoring expired sessions.
    pub fn resolve_session(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<Uuid>> {
        self.conn()
            .query_row(
                "SELECT user_id FROM sessions
                 WHERE token_hash = ?1 AND expires_at > ?2",
                params![token_hash, now.to_rfc3339()],
                |row| {
                    let s: String = row.get(0)?;
                    Uuid::parse_str(&s).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            0,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })
                },
            )
            .optional()
            .map_err(DbError::Sqlite)
    }

    /// Delete every session whose expiry has passed. Returns the number of
    /// rows removed.
    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let affected = self.conn().execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![now.to_rfc3339()],
        )?;
        Ok(affected)
    }
}
