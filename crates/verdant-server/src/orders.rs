//! Order intake, reads and status updates.
//!
//! Intake validates field-by-field in declaration order and surfaces the
//! first violation verbatim. The service trusts the client-submitted
//! subtotal / shipping / total and only adjusts the cash-on-delivery
//! surcharge; it does not recompute prices from a catalog.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use verdant_shared::constants::{DEFAULT_COUNTRY, DEFAULT_PAGE_LIMIT};
use verdant_shared::order::{self, Order, OrderItem, ShippingAddress};
use verdant_shared::protocol::{
    CreateOrderRequest, OrderCreated, OrderEnvelope, OrderSummary, OrdersPage, Pagination,
    StatusSummary, StatusUpdated, UpdateStatusRequest,
};
use verdant_shared::types::{OrderId, OrderStatus, PaymentMethod, PaymentStatus};
use verdant_shared::validate;

use crate::api::AppState;
use crate::db::DbError;
use crate::error::ServerError;
use crate::guard::{self, MaybeIdentity, AUTH_GENERIC};

/// `POST /api/orders`. Public; a valid credential links the order, an
/// unresolvable one downgrades to guest without failing the request.
pub async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderCreated>), ServerError> {
    let payment_method = validate_order(&req)?;

    let order_id = OrderId::generate();

    // Rename-only transform; prices are carried over untouched.
    let items: Vec<OrderItem> = req
        .items
        .iter()
        .map(|line| OrderItem {
            product_id: line.id.clone(),
            name: line.name.clone(),
            price: line.price,
            quantity: line.qty,
            image: line.image.clone(),
        })
        .collect();

    let form = &req.shipping_address;
    let shipping_address = ShippingAddress {
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        email: form.email.trim().to_lowercase(),
        phone_number: form.phone.trim().to_string(),
        street: form.address.trim().to_string(),
        city: form.city.trim().to_string(),
        state: form.state.trim().to_string(),
        pincode: form.pincode.clone(),
        country: DEFAULT_COUNTRY.to_string(),
    };

    let owner = match guard::resolve_optional(&headers, &state.db).await? {
        MaybeIdentity::User(user) => Some(*user),
        MaybeIdentity::Anonymous => None,
        MaybeIdentity::Invalid => {
            info!("invalid token on order creation, proceeding as guest");
            None
        }
    };

    let now = Utc::now();
    let estimated_delivery = order::estimate_delivery();

    let order = Order {
        order_id: order_id.clone(),
        user: owner.as_ref().map(|u| u.id),
        items,
        shipping_address,
        subtotal: req.subtotal,
        shipping_cost: req.shipping_cost,
        total: order::final_total(payment_method, req.total),
        payment_method,
        payment_status: PaymentStatus::Pending,
        order_status: if payment_method == PaymentMethod::CashOnDelivery {
            OrderStatus::Confirmed
        } else {
            OrderStatus::Pending
        },
        payment_reference: None,
        notes: req.notes.clone(),
        estimated_delivery: Some(estimated_delivery),
        tracking_number: None,
        created_at: now,
        updated_at: now,
    };

    {
        let db = state.db.lock().await;
        db.insert_order(&order)?;
        if let Some(user) = &owner {
            db.append_order_history(user.id, &order.order_id, now)?;
        }
    }

    info!(
        order_id = %order.order_id,
        guest = owner.is_none(),
        units = order.total_items(),
        total = order.total,
        method = %order.payment_method,
        "order placed"
    );

    let summary = OrderSummary::from(&order);
    Ok((
        StatusCode::CREATED,
        Json(OrderCreated {
            success: true,
            message: "Order placed successfully".into(),
            order_id,
            estimated_delivery,
            total: order.total,
            order: summary,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// `GET /api/orders`: the caller's own orders, newest first.
pub async fn list_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(q): Query<PageQuery>,
) -> Result<Json<OrdersPage>, ServerError> {
    let user = guard::authenticate(&headers, &state.db).await?;

    let page = q.page.unwrap_or(1).max(1);
    let limit = q.limit.unwrap_or(DEFAULT_PAGE_LIMIT).max(1);
    let offset = (page - 1) * limit;

    let db = state.db.lock().await;
    let orders = db.list_orders_for_user(user.id, limit, offset)?;
    let total_orders = db.count_orders_for_user(user.id)?;
    let total_pages = total_orders.div_ceil(u64::from(limit)) as u32;

    Ok(Json(OrdersPage {
        success: true,
        orders,
        pagination: Pagination {
            current_page: page,
            total_pages,
            total_orders,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        },
    }))
}

/// `GET /api/orders/:order_id`. Public. Ownership is only checked when the
/// order has an owner *and* a credential is presented.
pub async fn get_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Result<Json<OrderEnvelope>, ServerError> {
    let order = {
        let db = state.db.lock().await;
        match db.get_order(&order_id) {
            Ok(order) => order,
            Err(DbError::NotFound) => {
                return Err(ServerError::NotFound(
                    "No order found with this order ID".into(),
                ))
            }
            Err(e) => return Err(e.into()),
        }
    };

    if let Some(owner) = order.user {
        match guard::resolve_optional(&headers, &state.db).await? {
            MaybeIdentity::User(user) if user.id != owner => {
                return Err(ServerError::Forbidden(
                    "You are not authorized to view this order".into(),
                ));
            }
            MaybeIdentity::Invalid => {
                return Err(ServerError::Unauthorized(AUTH_GENERIC.into()));
            }
            _ => {}
        }
    }

    Ok(Json(OrderEnvelope {
        success: true,
        order,
    }))
}

/// `PUT /api/orders/:order_id/status` (guarded). Transitions are
/// intentionally unconstrained; only membership in the status enum is
/// enforced.
pub async fn update_status(
    State(state): State<AppState>,
    Path(order_id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<StatusUpdated>, ServerError> {
    let status: OrderStatus = req
        .status
        .parse()
        .map_err(|_| ServerError::validation("status", "Please provide a valid order status"))?;

    let db = state.db.lock().await;
    let order = match db.update_order_status(
        &order_id,
        status,
        req.tracking_number.as_deref(),
        Utc::now(),
    ) {
        Ok(order) => order,
        Err(DbError::NotFound) => return Err(ServerError::NotFound("Order not found".into())),
        Err(e) => return Err(e.into()),
    };

    info!(order_id = %order.order_id, status = %status, "order status updated");

    Ok(Json(StatusUpdated {
        success: true,
        message: "Order status updated successfully".into(),
        order: StatusSummary {
            order_id: order.order_id.clone(),
            status: order.order_status,
            tracking_number: order.tracking_number.clone(),
            updated_at: order.updated_at,
        },
    }))
}

/// Field-by-field validation in declaration order; the first violation wins.
fn validate_order(req: &CreateOrderRequest) -> Result<PaymentMethod, ServerError> {
    if req.items.is_empty() {
        return Err(ServerError::validation(
            "items",
            "At least one item is required",
        ));
    }
    for line in &req.items {
        if line.id.trim().is_empty() {
            return Err(ServerError::validation("items", "Item id is required"));
        }
        if line.name.trim().is_empty() {
            return Err(ServerError::validation("items", "Item name is required"));
        }
        if !(line.price >= 0.0) {
            return Err(ServerError::validation(
                "items",
                "Item price must be a non-negative number",
            ));
        }
        if line.qty < 1 {
            return Err(ServerError::validation(
                "items",
                "Item quantity must be at least 1",
            ));
        }
    }

    let addr = &req.shipping_address;
    required(&addr.first_name, "firstName", "First name is required")?;
    required(&addr.last_name, "lastName", "Last name is required")?;
    if !validate::email_ok(addr.email.trim()) {
        return Err(ServerError::validation(
            "email",
            "A valid email address is required",
        ));
    }
    if !validate::phone_ok(addr.phone.trim()) {
        return Err(ServerError::validation(
            "phone",
            "Phone number is not valid",
        ));
    }
    required(&addr.address, "address", "Street address is required")?;
    required(&addr.city, "city", "City is required")?;
    required(&addr.state, "state", "State is required")?;
    if !validate::pincode_ok(&addr.pincode) {
        return Err(ServerError::validation(
            "pincode",
            "PIN code must be 6 digits",
        ));
    }

    let payment_method: PaymentMethod = req.payment_method.parse().map_err(|_| {
        ServerError::validation(
            "paymentMethod",
            "Payment method must be one of gateway, cash-on-delivery, upi, card",
        )
    })?;

    for (field, value) in [
        ("subtotal", req.subtotal),
        ("shippingCost", req.shipping_cost),
        ("total", req.total),
    ] {
        if !(value >= 0.0) {
            return Err(ServerError::validation(
                field,
                format!("{field} must be a non-negative number"),
            ));
        }
    }

    Ok(payment_method)
}

fn required(value: &str, field: &str, message: &str) -> Result<(), ServerError> {
    if value.trim().is_empty() {
        return Err(ServerError::validation(field, message));
    }
    Ok(())
}
