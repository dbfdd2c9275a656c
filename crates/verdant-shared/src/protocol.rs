//! Request and response bodies for the storefront REST surface.
//!
//! Field names follow the wire (camelCase JSON). Enumerated fields on
//! *incoming* requests stay `String` so the boundary validator can reject
//! them with a proper field message instead of a deserializer error; the
//! domain types in [`crate::types`] are closed enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::UserProfile;
use crate::order::{Order, OrderItem};
use crate::types::{OrderId, OrderStatus};

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// One cart line as the client submits it at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub qty: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Shipping details as typed into the checkout form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShippingForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub items: Vec<CartLine>,
    pub shipping_address: ShippingForm,
    /// Validated against [`crate::types::PaymentMethod`] at the boundary.
    pub payment_method: String,
    pub subtotal: f64,
    pub shipping_cost: f64,
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Summary projection returned by order creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub items: Vec<OrderItem>,
    pub total: f64,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.order_id.clone(),
            items: order.items.clone(),
            total: order.total,
            status: order.order_status,
            estimated_delivery: order.estimated_delivery,
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub success: bool,
    pub message: String,
    pub order_id: OrderId,
    pub estimated_delivery: DateTime<Utc>,
    pub total: f64,
    pub order: OrderSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_orders: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrdersPage {
    pub success: bool,
    pub orders: Vec<Order>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderEnvelope {
    pub success: bool,
    pub order: Order,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    /// Validated against [`crate::types::OrderStatus`] at the boundary.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
}

/// Summary projection returned by a status update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub order_id: OrderId,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdated {
    pub success: bool,
    pub message: String,
    pub order: StatusSummary,
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyTokenResponse {
    pub success: bool,
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

// ---------------------------------------------------------------------------
// Misc
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Uniform error envelope. `message` carries the human-readable detail when
/// one is safe to surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_order_request_wire_shape() {
        let json = r#"{
            "items": [{"id": "neem-oil", "name": "Neem Oil", "price": 349.0, "qty": 2}],
            "shippingAddress": {
                "firstName": "Asha", "lastName": "Rao",
                "email": "asha@example.com", "phone": "9876543210",
                "address": "12 MG Road", "city": "Bengaluru",
                "state": "Karnataka", "pincode": "560001"
            },
            "paymentMethod": "upi",
            "subtotal": 698.0,
            "shippingCost": 0.0,
            "total": 698.0
        }"#;
        let req: CreateOrderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.items.len(), 1);
        assert_eq!(req.items[0].qty, 2);
        assert_eq!(req.shipping_address.pincode, "560001");
        assert!(req.notes.is_none());
    }

    #[test]
    fn pagination_fields_are_camel_case() {
        let page = Pagination {
            current_page: 1,
            total_pages: 3,
            total_orders: 25,
            has_next_page: true,
            has_prev_page: false,
        };
        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("hasNextPage").is_some());
        assert!(json.get("has_next_page").is_none());
    }
}
