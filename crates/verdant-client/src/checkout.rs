//! Checkout flow: turns the cart and session into an order submission.
//!
//! The cart is only cleared on a confirmed success, so a failed submission
//! leaves everything in place for a retry.

use verdant_shared::constants::{FLAT_SHIPPING_RATE, FREE_SHIPPING_THRESHOLD};
use verdant_shared::protocol::{CartLine, CreateOrderRequest, OrderCreated, ShippingForm};
use verdant_shared::types::PaymentMethod;

use crate::api::{ApiClient, ClientError};
use crate::cart::CartState;
use crate::notify::{Notification, Notifier};
use crate::session::SessionState;

/// Shipping is free above the threshold, a flat rate below it.
pub fn shipping_cost(subtotal: f64) -> f64 {
    if subtotal > FREE_SHIPPING_THRESHOLD {
        0.0
    } else {
        FLAT_SHIPPING_RATE
    }
}

/// When a user is signed in, their profile's name and email take precedence
/// over whatever was typed into the form.
fn prefer_identity(form: ShippingForm, session: &SessionState) -> ShippingForm {
    let Some(user) = session.identity() else {
        return form;
    };

    let first = user.first_name();
    let last = user.last_name();
    ShippingForm {
        first_name: if first.is_empty() {
            form.first_name
        } else {
            first.to_string()
        },
        last_name: if last.is_empty() {
            form.last_name
        } else {
            last.to_string()
        },
        email: if user.email.is_empty() {
            form.email
        } else {
            user.email.clone()
        },
        ..form
    }
}

/// Submit the current cart as an order.
///
/// On success the cart is cleared and a confirmation is surfaced; on failure
/// the cart is left untouched and the server's message (or a generic
/// fallback) is surfaced instead.
pub async fn place_order(
    cart: &mut CartState,
    session: &SessionState,
    api: &ApiClient,
    notifier: &dyn Notifier,
    shipping: ShippingForm,
    payment_method: PaymentMethod,
    notes: Option<String>,
) -> Result<OrderCreated, ClientError> {
    let subtotal = cart.subtotal();
    let shipping_cost = shipping_cost(subtotal);
    let total = subtotal + shipping_cost;

    let items: Vec<CartLine> = cart
        .items()
        .iter()
        .map(|i| CartLine {
            id: i.id.clone(),
            name: i.name.clone(),
            price: i.price,
            qty: i.qty,
            image: Some(i.image.clone()),
        })
        .collect();

    let request = CreateOrderRequest {
        items,
        shipping_address: prefer_identity(shipping, session),
        payment_method: payment_method.as_str().to_string(),
        subtotal,
        shipping_cost,
        total,
        notes,
    };

    match api.create_order(&request).await {
        Ok(confirmation) => {
            notifier.notify(Notification::info(
                "Order placed successfully!",
                format!(
                    "Your order {} has been confirmed. Estimated delivery: {}",
                    confirmation.order_id,
                    confirmation.estimated_delivery.format("%-d %B %Y")
                ),
            ));
            cart.clear();
            Ok(confirmation)
        }
        Err(e) => {
            notifier.notify(Notification::error(
                "Order failed",
                e.user_message("Could not place your order. Please try again."),
            ));
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use verdant_store::Database;

    use crate::notify::Level;

    struct SilentNotifier;
    impl Notifier for SilentNotifier {
        fn notify(&self, _n: Notification) {}
    }

    struct RecordingNotifier(Mutex<Vec<Notification>>);
    impl Notifier for RecordingNotifier {
        fn notify(&self, n: Notification) {
            self.0.lock().unwrap().push(n);
        }
    }

    fn open_store(dir: &tempfile::TempDir) -> Arc<Mutex<Database>> {
        Arc::new(Mutex::new(
            Database::open_at(&dir.path().join("checkout.db")).unwrap(),
        ))
    }

    fn form() -> ShippingForm {
        ShippingForm {
            first_name: "Asha".into(),
            last_name: "Rao".into(),
            email: "asha@example.com".into(),
            phone: "9876543210".into(),
            address: "12 MG Road".into(),
            city: "Bengaluru".into(),
            state: "Karnataka".into(),
            pincode: "560001".into(),
        }
    }

    #[test]
    fn shipping_rule() {
        assert_eq!(shipping_cost(499.0), FLAT_SHIPPING_RATE);
        assert_eq!(shipping_cost(500.0), FLAT_SHIPPING_RATE);
        assert_eq!(shipping_cost(501.0), 0.0);
    }

    #[test]
    fn guest_form_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionState::new(open_store(&dir), Arc::new(SilentNotifier));
        let shaped = prefer_identity(form(), &session);
        assert_eq!(shaped, form());
    }

    #[tokio::test]
    async fn failed_submission_leaves_cart_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        let notifier = Arc::new(RecordingNotifier(Mutex::new(Vec::new())));

        let mut cart = CartState::restore(store.clone(), Arc::new(SilentNotifier));
        cart.add_item(
            crate::cart::CartProduct {
                id: "rose-water".into(),
                name: "Rose Water".into(),
                price: 249.0,
                image: "/img/rose.jpg".into(),
            },
            2,
        );
        let session = SessionState::new(store.clone(), Arc::new(SilentNotifier));

        // Closed port: the submission fails as a transport error.
        let api = ApiClient::new("http://127.0.0.1:9", store);
        let result = place_order(
            &mut cart,
            &session,
            &api,
            notifier.as_ref(),
            form(),
            PaymentMethod::Upi,
            None,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(cart.count(), 2);

        let seen = notifier.0.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].level, Level::Error);
    }
}
