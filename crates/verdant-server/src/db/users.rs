//! CRUD operations for user records and the order-history list.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use verdant_shared::types::OrderId;
use verdant_shared::UserProfile;

use crate::db::{Db, DbError, Result};

/// Server-side user record. The password hash never crosses the wire; the
/// outward projection is [`UserProfile`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Stored lowercased; unique.
    pub email: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub phone_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
            created_at: self.created_at,
            last_login: self.last_login,
        }
    }
}

impl Db {
    /// Insert a new user. Fails on a duplicate email.
    pub fn create_user(&self, user: &User) -> Result<()> {
        self.conn().execute(
            "INSERT INTO users (id, name, email, password_hash, phone_number, created_at, last_login)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.id.to_string(),
                user.name,
                user.email,
                user.password_hash,
                user.phone_number,
                user.created_at.to_rfc3339(),
                user.last_login.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Fetch a single user by id.
    pub fn get_user(&self, id: Uuid) -> Result<User> {
        self.conn()
            .query_row(
                "SELECT id, name, email, password_hash, phone_number, created_at, last_login
                 FROM users WHERE id = ?1",
                params![id.to_string()],
                row_to_user,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => DbError::NotFound,
                other => DbError::Sqlite(other),
            })
    }

    /// Look a user up by (lowercased) email.
    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                "SELECT id, name, email, password_hash, phone_number, created_at, last_login
                 FROM users WHERE email = ?1",
                params![email],
                row_to_user,
            )
            .optional()
            .map_err(DbError::Sqlite)
    }

    /// Record a successful login.
    pub fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        self.conn().execute(
            "UPDATE users SET last_login = ?1 WHERE id = ?2",
            params![at.to_rfc3339(), id.to_string()],
        )?;
        Ok(())
    }

    /// Update the mutable profile fields. `None` leaves a field unchanged.
    pub fn update_user_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<User> {
        self.conn().execute(
            "UPDATE users
             SET name = COALESCE(?1, name),
                 phone_number = COALESCE(?2, phone_number)
             WHERE id = ?3",
            params![name, phone_number, id.to_string()],
        )?;
        self.get_user(id)
    }

    /// Append one order reference to a user's history. A single INSERT, so
    /// concurrent appends for the same user never lose an entry.
    pub fn append_order_history(
        &self,
        user_id: Uuid,
        order_id: &OrderId,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn().execute(
            "INSERT INTO order_history (user_id, order_id, created_at)
             VALUES (?1, ?2, ?3)",
            params![user_id.to_string(), order_id.as_str(), at.to_rfc3339()],
        )?;
        Ok(())
    }

    /// The user's order references, newest first.
    #[allow(dead_code)]
    pub fn order_history(&self, user_id: Uuid) -> Result<Vec<OrderId>> {
        let mut stmt = self.conn().prepare(
            "SELECT order_id FROM order_history
             WHERE user_id = ?1
             ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map(params![user_id.to_string()], |row| {
            row.get::<_, String>(0).map(OrderId::from)
        })?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }
}

/// Map a `rusqlite::Row` to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id_str: String = row.get(0)?;
    let name: String = row.get(1)?;
    let email: String = row.get(2)?;
    let password_hash: String = row.get(3)?;
    let phone_number: Option<String> = row.get(4)?;
    let created_str: String = row.get(5)?;
    let last_login_str: Option<String> = row.get(6)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let created_at = parse_timestamp(&created_str, 5)?;
    let last_login = last_login_str
        .map(|s| parse_timestamp(&s, 6))
        .transpose()?;

    Ok(User {
        id,
        name,
        email,
        password_hash,
        phone_number,
        created_at,
        last_login,
    })
}

pub(crate) fn parse_timestamp(raw: &str, column: usize) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Asha Rao".into(),
            email: email.into(),
            password_hash: "$argon2id$stub".into(),
            phone_number: Some("9876543210".into()),
            created_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn create_and_fetch_round_trip() {
        let db = Db::open_in_memory().unwrap();
        let user = sample_user("asha@example.com");
        db.create_user(&user).unwrap();

        let by_id = db.get_user(user.id).unwrap();
        assert_eq!(by_id.email, "asha@example.com");
        assert_eq!(by_id.phone_number.as_deref(), Some("9876543210"));

        let by_email = db.get_user_by_email("asha@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        assert!(db.get_user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = Db::open_in_memory().unwrap();
        db.create_user(&sample_user("asha@example.com")).unwrap();
        assert!(db.create_user(&sample_user("asha@example.com")).is_err());
    }

    #[test]
    fn last_login_is_recorded() {
        let db = Db::open_in_memory().unwrap();
        let user = sample_user("asha@example.com");
        db.create_user(&user).unwrap();

        let at = Utc::now();
        db.touch_last_login(user.id, at).unwrap();

        let fetched = db.get_user(user.id).unwrap();
        assert_eq!(fetched.last_login.unwrap().timestamp(), at.timestamp());
    }

    #[test]
    fn profile_update_keeps_unset_fields() {
        let db = Db::open_in_memory().unwrap();
        let user = sample_user("asha@example.com");
        db.create_user(&user).unwrap();

        let updated = db
            .update_user_profile(user.id, Some("Asha R."), None)
            .unwrap();
        assert_eq!(updated.name, "Asha R.");
        assert_eq!(updated.phone_number.as_deref(), Some("9876543210"));
    }

    #[test]
    fn history_appends_one_row_per_order() {
        let db = Db::open_in_memory().unwrap();
        let user = sample_user("asha@example.com");
        db.create_user(&user).unwrap();

        // History rows reference orders; the FK needs them present.
        let first = crate::db::orders::tests::sample_order(Some(user.id));
        let second = crate::db::orders::tests::sample_order(Some(user.id));
        db.insert_order(&first).unwrap();
        db.insert_order(&second).unwrap();

        db.append_order_history(user.id, &first.order_id, Utc::now())
            .unwrap();
        db.append_order_history(user.id, &second.order_id, Utc::now())
            .unwrap();

        let history = db.order_history(user.id).unwrap();
        assert_eq!(history.len(), 2);
    }
}
