//! Authenticated session state.
//!
//! Holds the signed-in identity and keeps the persisted profile and bearer
//! credential in lockstep: both are written together on a successful login
//! or signup, both are removed together on logout or failed verification.
//! No intermediate state ever has exactly one of the two set by this module.

use std::sync::{Arc, Mutex};

use tracing::warn;

use verdant_shared::constants::{CREDENTIAL_KEY, IDENTITY_KEY};
use verdant_shared::protocol::{AuthResponse, SignupRequest};
use verdant_shared::UserProfile;
use verdant_store::Database;

use crate::api::ApiClient;
use crate::notify::{Notification, Notifier};

pub struct SessionState {
    identity: Option<UserProfile>,
    busy: bool,
    store: Arc<Mutex<Database>>,
    notifier: Arc<dyn Notifier>,
}

impl SessionState {
    pub fn new(store: Arc<Mutex<Database>>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            identity: None,
            busy: false,
            store,
            notifier,
        }
    }

    /// The signed-in identity, if any.
    pub fn identity(&self) -> Option<&UserProfile> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// True while a login or signup is in flight. Callers should disable
    /// duplicate submissions; concurrent attempts are not queued and the
    /// last write to the identity wins.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Authenticate by password. On success the credential and profile are
    /// persisted together and the identity is set; on failure nothing
    /// changes and the reason is surfaced through the notifier.
    pub async fn login(&mut self, api: &ApiClient, email: &str, password: &str) -> bool {
        self.busy = true;
        let result = api.login(email, password).await;
        self.busy = false;

        match result {
            Ok(auth) => {
                let name = auth.user.name.clone();
                self.apply_auth_success(auth);
                self.notifier.notify(Notification::info(
                    "Welcome back!",
                    format!("Logged in as {name}"),
                ));
                true
            }
            Err(e) => {
                self.notifier.notify(Notification::error(
                    "Login failed",
                    e.user_message("Invalid email or password"),
                ));
                false
            }
        }
    }

    /// Register a new account. Password length and confirmation equality are
    /// the form layer's responsibility; the server re-checks length.
    pub async fn signup(&mut self, api: &ApiClient, data: SignupRequest) -> bool {
        self.busy = true;
        let result = api.signup(&data).await;
        self.busy = false;

        match result {
            Ok(auth) => {
                let name = auth.user.name.clone();
                self.apply_auth_success(auth);
                self.notifier.notify(Notification::info(
                    "Welcome to Verdant Botanicals!",
                    format!("Account created successfully for {name}"),
                ));
                true
            }
            Err(e) => {
                self.notifier.notify(Notification::error(
                    "Signup failed",
                    e.user_message("Unable to create account"),
                ));
                false
            }
        }
    }

    /// Clear the identity and both persisted keys. No network call.
    pub fn logout(&mut self) {
        self.purge();
        self.notifier.notify(Notification::info(
            "Logged out",
            "You have been logged out successfully",
        ));
    }

    /// Startup verification: when both a credential and a profile are
    /// persisted, ask the server whether the credential still holds. Valid ⇒
    /// the profile is restored into memory; invalid or unreachable ⇒ both
    /// are purged. One best-effort check, no periodic re-verification.
    pub async fn restore(&mut self, api: &ApiClient) {
        let (token, saved) = match self.store.lock() {
            Ok(db) => (
                db.get_text(CREDENTIAL_KEY).unwrap_or_default(),
                db.get_json::<UserProfile>(IDENTITY_KEY).unwrap_or_default(),
            ),
            Err(_) => (None, None),
        };

        let (Some(_token), Some(saved)) = (token, saved) else {
            return;
        };

        match api.verify_token().await {
            Ok(resp) if resp.valid => {
                self.identity = Some(saved);
            }
            Ok(_) => {
                warn!("stored credential rejected by server, clearing session");
                self.purge();
            }
            Err(e) => {
                warn!(error = %e, "credential verification failed, clearing session");
                self.purge();
            }
        }
    }

    /// Persist credential and profile together, then set the identity.
    fn apply_auth_success(&mut self, auth: AuthResponse) {
        match self.store.lock() {
            Ok(db) => {
                if let Err(e) = db.put_text(CREDENTIAL_KEY, &auth.token) {
                    warn!(error = %e, "failed to persist credential");
                }
                if let Err(e) = db.put_json(IDENTITY_KEY, &auth.user) {
                    warn!(error = %e, "failed to persist profile");
                }
            }
            Err(_) => warn!("store lock poisoned, session not persisted"),
        }
        self.identity = Some(auth.user);
    }

    /// Drop the in-memory identity and both persisted keys.
    fn purge(&mut self) {
        if let Ok(db) = self.store.lock() {
            let _ = db.delete(CREDENTIAL_KEY);
            let _ = db.delete(IDENTITY_KEY);
        }
        self.identity = None;
    }
}
