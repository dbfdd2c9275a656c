//! Shopping cart state.
//!
//! The cart is device-local and never synced server-side. Every mutation
//! synchronously rewrites the full item sequence into the client store, so
//! the cart survives navigation and restarts; a missing or unreadable stored
//! value simply yields an empty cart.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::warn;

use verdant_shared::constants::CART_KEY;
use verdant_store::Database;

use crate::notify::{Notification, Notifier};

/// One line in the cart. At most one entry exists per product id, and the
/// quantity is always at least 1; removal deletes the line instead of
/// letting it reach zero.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub id: String,
    pub name: String,
    /// Unit price in whole rupees.
    pub price: f64,
    pub image: String,
    pub qty: u32,
}

/// A catalog product about to be added, before a quantity is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct CartProduct {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub image: String,
}

pub struct CartState {
    items: Vec<CartItem>,
    store: Arc<Mutex<Database>>,
    notifier: Arc<dyn Notifier>,
}

impl CartState {
    /// Restore the cart from the store. Missing or unreadable data is
    /// logged and yields an empty cart, never an error.
    pub fn restore(store: Arc<Mutex<Database>>, notifier: Arc<dyn Notifier>) -> Self {
        let items = match store.lock() {
            Ok(db) => match db.get_json::<Vec<CartItem>>(CART_KEY) {
                Ok(Some(items)) => items,
                Ok(None) => Vec::new(),
                Err(e) => {
                    warn!(error = %e, "failed to load cart from store, starting empty");
                    Vec::new()
                }
            },
            Err(_) => {
                warn!("store lock poisoned, starting with empty cart");
                Vec::new()
            }
        };
        Self {
            items,
            store,
            notifier,
        }
    }

    /// Current lines in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Sum of quantities. Recomputed on every call.
    pub fn count(&self) -> u32 {
        self.items.iter().map(|i| i.qty).sum()
    }

    /// Sum of quantity × unit price. Recomputed on every call.
    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(|i| f64::from(i.qty) * i.price).sum()
    }

    /// Add `qty` units of a product. An existing line is topped up in place;
    /// a new product is appended, preserving insertion order.
    pub fn add_item(&mut self, product: CartProduct, qty: u32) {
        let qty = qty.max(1);
        let name = product.name.clone();

        match self.items.iter_mut().find(|i| i.id == product.id) {
            Some(line) => line.qty += qty,
            None => self.items.push(CartItem {
                id: product.id,
                name: product.name,
                price: product.price,
                image: product.image,
                qty,
            }),
        }

        self.notifier
            .notify(Notification::info("Added to cart", format!("{name} added.")));
        self.persist();
    }

    /// Remove a line entirely. Absent ids are a silent no-op.
    pub fn remove_item(&mut self, id: &str) {
        self.items.retain(|i| i.id != id);
        self.persist();
    }

    /// Set a line's quantity, clamped to a minimum of 1. Absent ids are a
    /// silent no-op.
    pub fn update_quantity(&mut self, id: &str, qty: i64) {
        let qty = qty.max(1) as u32;
        if let Some(line) = self.items.iter_mut().find(|i| i.id == id) {
            line.qty = qty;
        }
        self.persist();
    }

    /// Empty the cart (also called after a confirmed order).
    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    fn persist(&self) {
        match self.store.lock() {
            Ok(db) => {
                if let Err(e) = db.put_json(CART_KEY, &self.items) {
                    warn!(error = %e, "failed to persist cart");
                }
            }
            Err(_) => warn!("store lock poisoned, cart not persisted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct RecordingNotifier(Mutex<Vec<Notification>>);

    impl Notifier for RecordingNotifier {
        fn notify(&self, n: Notification) {
            self.0.lock().unwrap().push(n);
        }
    }

    fn open_store(dir: &tempfile::TempDir) -> Arc<Mutex<Database>> {
        Arc::new(Mutex::new(
            Database::open_at(&dir.path().join("cart.db")).unwrap(),
        ))
    }

    fn product(id: &str, price: f64) -> CartProduct {
        CartProduct {
            id: id.into(),
            name: format!("Product {id}"),
            price,
            image: format!("/img/{id}.jpg"),
        }
    }

    #[test]
    fn derived_values_track_mutations() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        let mut cart = CartState::restore(store, Arc::new(LogNotifierForTests));

        cart.add_item(product("rose-water", 249.0), 1);
        cart.add_item(product("neem-oil", 349.0), 2);
        assert_eq!(cart.count(), 3);
        assert_eq!(cart.subtotal(), 249.0 + 2.0 * 349.0);

        cart.update_quantity("rose-water", 4);
        assert_eq!(cart.count(), 6);
        assert_eq!(cart.subtotal(), 4.0 * 249.0 + 2.0 * 349.0);

        cart.remove_item("neem-oil");
        assert_eq!(cart.count(), 4);
        assert_eq!(cart.subtotal(), 4.0 * 249.0);
    }

    #[test]
    fn adding_existing_id_merges_instead_of_duplicating() {
        let dir = tempfile::tempdir().unwrap();
        let mut cart = CartState::restore(open_store(&dir), Arc::new(LogNotifierForTests));

        cart.add_item(product("neem-oil", 349.0), 1);
        cart.add_item(product("neem-oil", 349.0), 2);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].qty, 3);
    }

    #[test]
    fn quantity_clamps_to_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut cart = CartState::restore(open_store(&dir), Arc::new(LogNotifierForTests));
        cart.add_item(product("rose-water", 249.0), 2);

        cart.update_quantity("rose-water", 0);
        assert_eq!(cart.items()[0].qty, 1);

        cart.update_quantity("rose-water", -5);
        assert_eq!(cart.items()[0].qty, 1);
    }

    #[test]
    fn absent_ids_are_no_ops() {
        let dir = tempfile::tempdir().unwrap();
        let mut cart = CartState::restore(open_store(&dir), Arc::new(LogNotifierForTests));
        cart.add_item(product("rose-water", 249.0), 1);

        cart.remove_item("ghost");
        cart.update_quantity("ghost", 5);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].qty, 1);
    }

    #[test]
    fn reload_reproduces_the_exact_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let mut cart = CartState::restore(store.clone(), Arc::new(LogNotifierForTests));
        cart.add_item(product("rose-water", 249.0), 2);
        cart.add_item(product("neem-oil", 349.0), 1);
        cart.add_item(product("tulsi-balm", 199.0), 5);
        let before: Vec<CartItem> = cart.items().to_vec();

        let reloaded = CartState::restore(store, Arc::new(LogNotifierForTests));
        assert_eq!(reloaded.items(), before.as_slice());
    }

    #[test]
    fn clear_persists_an_empty_cart() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);

        let mut cart = CartState::restore(store.clone(), Arc::new(LogNotifierForTests));
        cart.add_item(product("rose-water", 249.0), 2);
        cart.clear();

        let reloaded = CartState::restore(store, Arc::new(LogNotifierForTests));
        assert!(reloaded.items().is_empty());
        assert_eq!(reloaded.count(), 0);
    }

    #[test]
    fn corrupt_store_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir);
        store
            .lock()
            .unwrap()
            .put_text(CART_KEY, "{definitely not json")
            .unwrap();

        let cart = CartState::restore(store, Arc::new(LogNotifierForTests));
        assert!(cart.items().is_empty());
    }

    #[test]
    fn add_item_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let notifier = Arc::new(RecordingNotifier(Mutex::new(Vec::new())));
        let mut cart = CartState::restore(open_store(&dir), notifier.clone());

        cart.add_item(product("rose-water", 249.0), 1);

        let seen = notifier.0.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].title, "Added to cart");
    }

    /// Quiet stand-in so test output stays clean.
    struct LogNotifierForTests;
    impl Notifier for LogNotifierForTests {
        fn notify(&self, _n: Notification) {}
    }
}
