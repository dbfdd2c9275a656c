//! Composition root.
//!
//! The cart, session and API gateway are explicit owned objects handed out
//! from here, never ambient singletons, so shells and tests can wire their
//! own store and notifier.

use std::sync::{Arc, Mutex};

use verdant_shared::protocol::{OrderCreated, ShippingForm, SignupRequest};
use verdant_shared::types::PaymentMethod;
use verdant_store::{Database, StoreError};

use crate::api::{ApiClient, ClientError};
use crate::cart::CartState;
use crate::checkout;
use crate::notify::{LogNotifier, Notifier};
use crate::session::SessionState;

/// Everything the UI layer needs, owned in one place.
pub struct Storefront {
    pub cart: CartState,
    pub session: SessionState,
    pub api: ApiClient,
    notifier: Arc<dyn Notifier>,
}

impl Storefront {
    /// Open the default on-device store and wire the state objects to it.
    pub fn open(server_url: &str) -> Result<Self, StoreError> {
        let db = Database::open_default()?;
        Ok(Self::with_store(db, server_url, Arc::new(LogNotifier)))
    }

    /// Build around an explicit store and notifier (tests, custom shells).
    pub fn with_store(db: Database, server_url: &str, notifier: Arc<dyn Notifier>) -> Self {
        let store = Arc::new(Mutex::new(db));
        let api = ApiClient::new(server_url, store.clone());
        let cart = CartState::restore(store.clone(), notifier.clone());
        let session = SessionState::new(store, notifier.clone());
        Self {
            cart,
            session,
            api,
            notifier,
        }
    }

    /// Best-effort startup verification of a persisted session.
    pub async fn restore_session(&mut self) {
        self.session.restore(&self.api).await;
    }

    pub async fn login(&mut self, email: &str, password: &str) -> bool {
        self.session.login(&self.api, email, password).await
    }

    pub async fn signup(&mut self, data: SignupRequest) -> bool {
        self.session.signup(&self.api, data).await
    }

    pub fn logout(&mut self) {
        self.session.logout();
    }

    /// Submit the cart as an order; clears the cart only on success.
    pub async fn place_order(
        &mut self,
        shipping: ShippingForm,
        payment_method: PaymentMethod,
        notes: Option<String>,
    ) -> Result<OrderCreated, ClientError> {
        checkout::place_order(
            &mut self.cart,
            &self.session,
            &self.api,
            self.notifier.as_ref(),
            shipping,
            payment_method,
            notes,
        )
        .await
    }
}
