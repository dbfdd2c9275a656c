//! # verdant-client
//!
//! Client-side core of the Verdant storefront: cart state, session state,
//! the HTTP gateway and the checkout flow, all persisted through
//! [`verdant_store`]. State objects are owned by the [`Storefront`]
//! composition root and handed to consumers explicitly.

pub mod api;
pub mod cart;
pub mod checkout;
pub mod notify;
pub mod session;
pub mod state;

use tracing_subscriber::{fmt, EnvFilter};

pub use api::{ApiClient, ClientError};
pub use cart::{CartItem, CartProduct, CartState};
pub use notify::{LogNotifier, Notification, Notifier};
pub use session::SessionState;
pub use state::Storefront;

/// Initialise tracing for shells that bring no subscriber of their own.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("verdant_client=debug,verdant_store=info,warn"));

    fmt().with_env_filter(filter).with_target(true).init();
}
