//! Identity Guard: resolves a bearer credential to a live user.
//!
//! Protected routes go through [`require_identity`]; routes that only link
//! opportunistically (order creation, the public order read) use
//! [`resolve_optional`] and decide for themselves what an unresolvable
//! credential means. Store faults are surfaced as server errors, never as
//! authentication rejections.

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::api::AppState;
use crate::db::users::User;
use crate::db::{Db, DbError};
use crate::error::ServerError;

/// Generic wording for every credential rejection; the cause is only logged.
pub const AUTH_GENERIC: &str = "Invalid or missing authentication token";

/// The resolved identity, attached to guarded requests as an extension.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Extract the bearer token from an `Authorization` header, if any.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    auth.strip_prefix("Bearer ").filter(|t| !t.is_empty())
}

/// Hash a presented token the way issued tokens are stored.
pub fn hash_token(token: &str) -> String {
    blake3::hash(token.as_bytes()).to_hex().to_string()
}

/// Outcome of an opportunistic credential resolution.
pub enum MaybeIdentity {
    /// No credential presented.
    Anonymous,
    /// The credential resolves to a live user.
    User(Box<User>),
    /// A credential was presented but does not resolve (unknown, expired,
    /// or its user no longer exists).
    Invalid,
}

/// Resolve the request's credential without rejecting anything.
pub async fn resolve_optional(
    headers: &HeaderMap,
    db: &Mutex<Db>,
) -> Result<MaybeIdentity, ServerError> {
    let Some(token) = bearer_token(headers) else {
        return Ok(MaybeIdentity::Anonymous);
    };

    let hash = hash_token(token);
    let db = db.lock().await;

    let Some(user_id) = db.resolve_session(&hash, Utc::now())? else {
        return Ok(MaybeIdentity::Invalid);
    };

    match db.get_user(user_id) {
        Ok(user) => Ok(MaybeIdentity::User(Box::new(user))),
        Err(DbError::NotFound) => {
            debug!(user = %user_id, "session resolves to a vanished user");
            Ok(MaybeIdentity::Invalid)
        }
        Err(e) => Err(e.into()),
    }
}

/// The gate itself: a live identity or a generic 401.
pub async fn authenticate(headers: &HeaderMap, db: &Mutex<Db>) -> Result<User, ServerError> {
    match resolve_optional(headers, db).await? {
        MaybeIdentity::User(user) => Ok(*user),
        MaybeIdentity::Anonymous => {
            debug!("request without bearer token rejected");
            Err(ServerError::Unauthorized(AUTH_GENERIC.into()))
        }
        MaybeIdentity::Invalid => {
            debug!("bearer token did not resolve to a live session");
            Err(ServerError::Unauthorized(AUTH_GENERIC.into()))
        }
    }
}

/// Middleware for protected routes: attaches [`CurrentUser`] on success.
pub async fn require_identity(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let user = authenticate(req.headers(), &state.db).await?;
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use uuid::Uuid;

    fn seeded(db: &Db) -> (Uuid, String) {
        let user = User {
            id: Uuid::new_v4(),
            name: "Asha Rao".into(),
            email: "asha@example.com".into(),
            password_hash: "$argon2id$stub".into(),
            phone_number: None,
            created_at: Utc::now(),
            last_login: None,
        };
        db.create_user(&user).unwrap();

        let token = "aabbccddeeff00112233445566778899".to_string();
        db.create_session(&hash_token(&token), user.id, 30, Utc::now())
            .unwrap();
        (user.id, token)
    }

    fn headers_with(token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            headers.insert(
                header::AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
            );
        }
        headers
    }

    #[test]
    fn token_hashing_is_stable() {
        assert_eq!(hash_token("abc"), hash_token("abc"));
        assert_ne!(hash_token("abc"), hash_token("abd"));
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(
            bearer_token(&headers_with(Some("tok123"))),
            Some("tok123")
        );
        assert_eq!(bearer_token(&headers_with(None)), None);

        let mut malformed = HeaderMap::new();
        malformed.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(bearer_token(&malformed), None);

        let mut empty = HeaderMap::new();
        empty.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&empty), None);
    }

    #[tokio::test]
    async fn valid_token_resolves_to_user() {
        let db = Db::open_in_memory().unwrap();
        let (user_id, token) = seeded(&db);
        let db = Mutex::new(db);

        let user = authenticate(&headers_with(Some(&token)), &db).await.unwrap();
        assert_eq!(user.id, user_id);
    }

    #[tokio::test]
    async fn missing_and_unknown_tokens_are_rejected_alike() {
        let db = Db::open_in_memory().unwrap();
        let _ = seeded(&db);
        let db = Mutex::new(db);

        let missing = authenticate(&headers_with(None), &db).await;
        let unknown = authenticate(&headers_with(Some("ffff")), &db).await;

        for result in [missing, unknown] {
            match result {
                Err(ServerError::Unauthorized(msg)) => assert_eq!(msg, AUTH_GENERIC),
                other => panic!("expected Unauthorized, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn optional_resolution_distinguishes_absent_from_invalid() {
        let db = Db::open_in_memory().unwrap();
        let _ = seeded(&db);
        let db = Mutex::new(db);

        assert!(matches!(
            resolve_optional(&headers_with(None), &db).await.unwrap(),
            MaybeIdentity::Anonymous
        ));
        assert!(matches!(
            resolve_optional(&headers_with(Some("ffff")), &db)
                .await
                .unwrap(),
            MaybeIdentity::Invalid
        ));
    }
}
