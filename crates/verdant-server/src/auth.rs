//! Account registration, login, credential verification and profile
//! management.
//!
//! Passwords are stored as Argon2id hashes. Issued bearer tokens are random
//! bytes handed to the client in hex; only their blake3 hash is persisted,
//! bounded by the configured session TTL.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use rand::RngCore;
use tracing::{debug, info};
use uuid::Uuid;

use verdant_shared::constants::{MIN_PASSWORD_LEN, TOKEN_BYTES};
use verdant_shared::protocol::{
    AuthResponse, LoginRequest, ProfileResponse, SignupRequest, UpdateProfileRequest,
    VerifyTokenResponse,
};
use verdant_shared::validate;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::db::users::User;
use crate::db::Db;
use crate::error::ServerError;
use crate::guard::{self, CurrentUser};

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ServerError> {
    validate_signup(&req)?;

    let email = req.email.trim().to_lowercase();
    let now = Utc::now();

    let db = state.db.lock().await;
    if db.get_user_by_email(&email)?.is_some() {
        return Err(ServerError::Conflict(
            "An account with this email already exists".into(),
        ));
    }

    let user = User {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        email,
        password_hash: hash_password(&req.password)?,
        phone_number: req.phone_number.clone(),
        created_at: now,
        last_login: Some(now),
    };
    db.create_user(&user)?;

    let token = issue_token(&db, &state.config, user.id)?;

    info!(user = %user.id, "account registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "Account created successfully".into(),
            token,
            user: user.profile(),
        }),
    ))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ServerError> {
    let email = req.email.trim().to_lowercase();
    let db = state.db.lock().await;

    // One generic rejection for unknown email and wrong password alike.
    let Some(mut user) = db.get_user_by_email(&email)? else {
        debug!("login failed: unknown email");
        return Err(ServerError::Unauthorized("Invalid email or password".into()));
    };
    if !verify_password(&req.password, &user.password_hash) {
        debug!(user = %user.id, "login failed: wrong password");
        return Err(ServerError::Unauthorized("Invalid email or password".into()));
    }

    let now = Utc::now();
    db.touch_last_login(user.id, now)?;
    user.last_login = Some(now);

    let token = issue_token(&db, &state.config, user.id)?;

    info!(user = %user.id, "login");

    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful".into(),
        token,
        user: user.profile(),
    }))
}

/// `POST /api/auth/verify-token` (guarded)
pub async fn verify_token(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<VerifyTokenResponse> {
    Json(VerifyTokenResponse {
        success: true,
        valid: true,
        user: Some(user.profile()),
    })
}

/// `GET /api/auth/profile` (guarded)
pub async fn get_profile(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        success: true,
        user: user.profile(),
    })
}

/// `PUT /api/auth/profile` (guarded)
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ServerError> {
    if let Some(name) = &req.name {
        if name.trim().is_empty() {
            return Err(ServerError::validation("name", "Name cannot be empty"));
        }
    }
    if let Some(phone) = &req.phone_number {
        if !validate::phone_ok(phone.trim()) {
            return Err(ServerError::validation(
                "phoneNumber",
                "Phone number is not valid",
            ));
        }
    }

    let db = state.db.lock().await;
    let updated = db.update_user_profile(
        user.id,
        req.name.as_deref().map(str::trim),
        req.phone_number.as_deref().map(str::trim),
    )?;

    Ok(Json(ProfileResponse {
        success: true,
        user: updated.profile(),
    }))
}

fn validate_signup(req: &SignupRequest) -> Result<(), ServerError> {
    if req.name.trim().is_empty() {
        return Err(ServerError::validation("name", "Name is required"));
    }
    if !validate::email_ok(req.email.trim()) {
        return Err(ServerError::validation(
            "email",
            "A valid email address is required",
        ));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServerError::validation(
            "password",
            "Password must be at least 6 characters",
        ));
    }
    if let Some(phone) = &req.phone_number {
        if !validate::phone_ok(phone.trim()) {
            return Err(ServerError::validation(
                "phoneNumber",
                "Phone number is not valid",
            ));
        }
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, ServerError> {
    use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};
    use argon2::Argon2;

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServerError::Internal(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, stored: &str) -> bool {
    use argon2::password_hash::{PasswordHash, PasswordVerifier};
    use argon2::Argon2;

    let Ok(parsed) = PasswordHash::new(stored) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Mint a fresh bearer token and record its hash.
fn issue_token(db: &Db, config: &ServerConfig, user_id: Uuid) -> Result<String, ServerError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let token = hex::encode(bytes);

    db.create_session(
        &guard::hash_token(&token),
        user_id,
        config.session_ttl_days,
        Utc::now(),
    )?;
    Ok(token)
}
