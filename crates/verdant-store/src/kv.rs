//! Typed key/value access to the client store.
//!
//! Each key holds exactly one value, tagged with the layout version that
//! wrote it. A value written by a different layout version reads back as
//! absent, so a restore never parses a foreign shape.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::database::Database;
use crate::error::Result;

/// Version stamped on every stored value.
pub const VALUE_SCHEMA_VERSION: u32 = 1;

impl Database {
    /// Serialize `value` as JSON and store it under `key`, replacing any
    /// previous value.
    pub fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.put_text(key, &json)
    }

    /// Read the JSON value stored under `key`.
    ///
    /// Returns `Ok(None)` when the key is absent or was written by a
    /// different layout version; corrupt JSON is an `Err` so callers can
    /// decide how loudly to recover.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_text(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Store a raw text value (used for the bearer credential).
    pub fn put_text(&self, key: &str, value: &str) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO kv_store (key, value, schema_version, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![key, value, VALUE_SCHEMA_VERSION, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Read a raw text value. Foreign-version rows read as absent.
    pub fn get_text(&self, key: &str) -> Result<Option<String>> {
        let row = self
            .conn()
            .query_row(
                "SELECT value, schema_version FROM kv_store WHERE key = ?1",
                params![key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?)),
            )
            .optional()?;

        match row {
            Some((value, version)) if version == VALUE_SCHEMA_VERSION => Ok(Some(value)),
            Some((_, version)) => {
                tracing::warn!(key, version, "stored value has foreign layout version, ignoring");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Delete the value under `key`. Returns `true` if a row was deleted.
    pub fn delete(&self, key: &str) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
    struct Sample {
        id: String,
        qty: u32,
    }

    fn open_temp() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("kv.db")).unwrap();
        (db, dir)
    }

    #[test]
    fn json_round_trip_preserves_order() {
        let (db, _dir) = open_temp();
        let items = vec![
            Sample { id: "rose".into(), qty: 1 },
            Sample { id: "neem".into(), qty: 3 },
        ];

        db.put_json("cart", &items).unwrap();
        let restored: Vec<Sample> = db.get_json("cart").unwrap().unwrap();
        assert_eq!(restored, items);
    }

    #[test]
    fn missing_key_reads_none() {
        let (db, _dir) = open_temp();
        let got: Option<Vec<Sample>> = db.get_json("nothing").unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn corrupt_json_is_an_error_not_a_panic() {
        let (db, _dir) = open_temp();
        db.put_text("cart", "{not json").unwrap();
        let got: Result<Option<Vec<Sample>>> = db.get_json("cart");
        assert!(got.is_err());
    }

    #[test]
    fn foreign_version_reads_as_absent() {
        let (db, _dir) = open_temp();
        db.put_text("cart", "[]").unwrap();
        db.conn()
            .execute(
                "UPDATE kv_store SET schema_version = 99 WHERE key = 'cart'",
                [],
            )
            .unwrap();

        let got: Option<Vec<Sample>> = db.get_json("cart").unwrap();
        assert!(got.is_none());
    }

    #[test]
    fn delete_reports_presence() {
        let (db, _dir) = open_temp();
        db.put_text("token", "abc123").unwrap();

        assert!(db.delete("token").unwrap());
        assert!(!db.delete("token").unwrap());
        assert!(db.get_text("token").unwrap().is_none());
    }

    #[test]
    fn replace_overwrites() {
        let (db, _dir) = open_temp();
        db.put_text("token", "first").unwrap();
        db.put_text("token", "second").unwrap();
        assert_eq!(db.get_text("token").unwrap().unwrap(), "second");
    }
}
