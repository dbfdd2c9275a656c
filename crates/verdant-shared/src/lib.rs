//! # verdant-shared
//!
//! Domain types shared between the Verdant storefront client and server:
//! order records, closed payment/status enumerations, wire request and
//! response bodies, and the pricing / delivery rules the order pipeline
//! enforces on both sides of the wire.

pub mod constants;
pub mod identity;
pub mod order;
pub mod protocol;
pub mod types;
pub mod validate;

pub use identity::UserProfile;
pub use order::{Order, OrderItem, ShippingAddress};
pub use types::{OrderId, OrderStatus, PaymentMethod, PaymentStatus};
