//! CRUD operations for order documents.
//!
//! Items and the shipping address are persisted as embedded JSON documents;
//! the scalar columns exist for querying and pagination.

use chrono::{DateTime, Utc};
use rusqlite::params;
use uuid::Uuid;

use verdant_shared::order::{Order, OrderItem, ShippingAddress};
use verdant_shared::types::{OrderId, OrderStatus, PaymentMethod, PaymentStatus};

use crate::db::users::parse_timestamp;
use crate::db::{Db, DbError, Result};

impl Db {
    /// Persist a new order document.
    pub fn insert_order(&self, order: &Order) -> Result<()> {
        let items_json = serde_json::to_string(&order.items)?;
        let shipping_json = serde_json::to_string(&order.shipping_address)?;

        self.conn().execute(
            "INSERT INTO orders (
                 order_id, user_id, items, shipping_address,
                 subtotal, shipping_cost, total,
                 payment_method, payment_status, order_status,
                 payment_reference, notes, estimated_delivery, tracking_number,
                 created_at, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                order.order_id.as_str(),
                order.user.map(|u| u.to_string()),
                items_json,
                shipping_json,
                order.subtotal,
                order.shipping_cost,
                order.total,
                order.payment_method.as_str(),
                order.payment_status.as_str(),
                order.order_status.as_str(),
                order.payment_reference,
                order.notes,
                order.estimated_delivery.map(|t| t.to_rfc3339()),
                order.tracking_number,
                order.created_at.to_rfc3339(),
                order.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch a single order by its public id.
    pub fn get_order(&self, order_id: &str) -> Result<Order> {
        self.conn()
            .query_row(
                &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = ?1"),
                params![order_id],
                row_to_order,
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => DbError::NotFound,
                other => DbError::Sqlite(other),
            })
    }

    /// A user's orders, newest first.
    pub fn list_orders_for_user(
        &self,
        user_id: Uuid,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Order>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE user_id = ?1
             ORDER BY created_at DESC
             LIMIT ?2 OFFSET ?3"
        ))?;

        let rows = stmt.query_map(params![user_id.to_string(), limit, offset], row_to_order)?;

        let mut orders = Vec::new();
        for row in rows {
            orders.push(row?);
        }
        Ok(orders)
    }

    pub fn count_orders_for_user(&self, user_id: Uuid) -> Result<u64> {
        let count: u64 = self.conn().query_row(
            "SELECT COUNT(*) FROM orders WHERE user_id = ?1",
            params![user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Set the fulfilment status (and optionally the tracking number),
    /// refreshing `updated_at`. Returns the updated order.
    pub fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
        tracking_number: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Order> {
        let affected = self.conn().execute(
            "UPDATE orders
             SET order_status = ?1,
                 tracking_number = COALESCE(?2, tracking_number),
                 updated_at = ?3
             WHERE order_id = ?4",
            params![status.as_str(), tracking_number, now.to_rfc3339(), order_id],
        )?;

        if affected == 0 {
            return Err(DbError::NotFound);
        }
        self.get_order(order_id)
    }
}

const ORDER_COLUMNS: &str = "order_id, user_id, items, shipping_address, \
     subtotal, shipping_cost, total, \
     payment_method, payment_status, order_status, \
     payment_reference, notes, estimated_delivery, tracking_number, \
     created_at, updated_at";

/// Map a `rusqlite::Row` to an [`Order`].
fn row_to_order(row: &rusqlite::Row<'_>) -> rusqlite::Result<Order> {
    let order_id: String = row.get(0)?;
    let user_str: Option<String> = row.get(1)?;
    let items_json: String = row.get(2)?;
    let shipping_json: String = row.get(3)?;
    let subtotal: f64 = row.get(4)?;
    let shipping_cost: f64 = row.get(5)?;
    let total: f64 = row.get(6)?;
    let payment_method: String = row.get(7)?;
    let payment_status: String = row.get(8)?;
    let order_status: String = row.get(9)?;
    let payment_reference: Option<String> = row.get(10)?;
    let notes: Option<String> = row.get(11)?;
    let estimated_str: Option<String> = row.get(12)?;
    let tracking_number: Option<String> = row.get(13)?;
    let created_str: String = row.get(14)?;
    let updated_str: String = row.get(15)?;

    let user = user_str
        .map(|s| Uuid::parse_str(&s))
        .transpose()
        .map_err(|e| conversion(1, e))?;

    let items: Vec<OrderItem> =
        serde_json::from_str(&items_json).map_err(|e| conversion(2, e))?;
    let shipping_address: ShippingAddress =
        serde_json::from_str(&shipping_json).map_err(|e| conversion(3, e))?;

    let payment_method: PaymentMethod =
        payment_method.parse().map_err(|e| conversion(7, e))?;
    let payment_status: PaymentStatus =
        payment_status.parse().map_err(|e| conversion(8, e))?;
    let order_status: OrderStatus = order_status.parse().map_err(|e| conversion(9, e))?;

    let estimated_delivery = estimated_str
        .map(|s| parse_timestamp(&s, 12))
        .transpose()?;
    let created_at = parse_timestamp(&created_str, 14)?;
    let updated_at = parse_timestamp(&updated_str, 15)?;

    Ok(Order {
        order_id: OrderId::from(order_id),
        user,
        items,
        shipping_address,
        subtotal,
        shipping_cost,
        total,
        payment_method,
        payment_status,
        order_status,
        payment_reference,
        notes,
        estimated_delivery,
        tracking_number,
        created_at,
        updated_at,
    })
}

fn conversion<E>(column: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}
