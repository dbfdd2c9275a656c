//! The server-owned order record and the pricing / delivery rules applied at
//! intake.

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{
    COD_SURCHARGE, DEFAULT_COUNTRY, DELIVERY_MAX_BUSINESS_DAYS, DELIVERY_MIN_BUSINESS_DAYS,
};
use crate::types::{OrderId, OrderStatus, PaymentMethod, PaymentStatus};

/// A single purchased line within an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    /// Unit price in whole rupees.
    pub price: f64,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Shipping destination embedded in the order document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

/// The full order record. Owned by the server; clients only ever receive
/// copies of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub order_id: OrderId,
    /// Owning user, absent for guest orders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Uuid>,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub subtotal: f64,
    pub shipping_cost: f64,
    pub total: f64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Total number of units across all lines.
    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn customer_name(&self) -> String {
        format!(
            "{} {}",
            self.shipping_address.first_name, self.shipping_address.last_name
        )
    }
}

/// Final charged total: cash-on-delivery orders carry the fixed surcharge,
/// applied exactly once, server-side; every other method keeps the
/// client-submitted total unchanged.
pub fn final_total(method: PaymentMethod, client_total: f64) -> f64 {
    match method {
        PaymentMethod::CashOnDelivery => client_total + COD_SURCHARGE,
        _ => client_total,
    }
}

/// Walk forward from `from` one calendar day at a time, counting only
/// Mon-Fri, until `business_days` weekdays have been counted. Weekends are
/// stepped through but never counted, so the result always lands on a
/// weekday strictly after `from`.
pub fn estimated_delivery_from(from: DateTime<Utc>, business_days: u32) -> DateTime<Utc> {
    let mut date = from;
    let mut counted = 0;
    while counted < business_days {
        date += Duration::days(1);
        if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            counted += 1;
        }
    }
    date
}

/// Pick a pseudo-random 7-10 business-day estimate starting now.
pub fn estimate_delivery() -> DateTime<Utc> {
    let days =
        rand::thread_rng().gen_range(DELIVERY_MIN_BUSINESS_DAYS..=DELIVERY_MAX_BUSINESS_DAYS);
    estimated_delivery_from(Utc::now(), days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn cod_surcharge_applied_once() {
        assert_eq!(final_total(PaymentMethod::CashOnDelivery, 1000.0), 1025.0);
        assert_eq!(final_total(PaymentMethod::Card, 1000.0), 1000.0);
        assert_eq!(final_total(PaymentMethod::Gateway, 1000.0), 1000.0);
        assert_eq!(final_total(PaymentMethod::Upi, 1000.0), 1000.0);
    }

    #[test]
    fn delivery_lands_on_weekday() {
        // 2024-06-14 is a Friday; walking over the weekend must not count it.
        let friday = Utc.with_ymd_and_hms(2024, 6, 14, 12, 0, 0).unwrap();
        for days in DELIVERY_MIN_BUSINESS_DAYS..=DELIVERY_MAX_BUSINESS_DAYS {
            let est = estimated_delivery_from(friday, days);
            assert!(est > friday);
            assert!(!matches!(est.weekday(), Weekday::Sat | Weekday::Sun));
        }
    }

    #[test]
    fn delivery_counts_exact_business_days() {
        // Monday + 7 business days = Wednesday the following week,
        // having skipped one weekend.
        let monday = Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap();
        let est = estimated_delivery_from(monday, 7);
        assert_eq!(est.weekday(), Weekday::Wed);
        assert_eq!((est - monday).num_days(), 9);
    }

    #[test]
    fn delivery_from_saturday_starts_monday() {
        let saturday = Utc.with_ymd_and_hms(2024, 6, 15, 9, 0, 0).unwrap();
        let est = estimated_delivery_from(saturday, 1);
        assert_eq!(est.weekday(), Weekday::Mon);
    }

    #[test]
    fn randomised_estimate_in_window() {
        let now = Utc::now();
        for _ in 0..20 {
            let est = estimate_delivery();
            // 7 business days span at least 9 calendar days from a weekday;
            // 10 business days never span more than 16.
            let days = (est - now).num_days();
            assert!((7..=16).contains(&days), "estimate {days} days out");
        }
    }

    #[test]
    fn address_country_defaults() {
        let json = r#"{
            "firstName": "Asha", "lastName": "Rao",
            "email": "asha@example.com", "phoneNumber": "9876543210",
            "street": "12 MG Road", "city": "Bengaluru",
            "state": "Karnataka", "pincode": "560001"
        }"#;
        let addr: ShippingAddress = serde_json::from_str(json).unwrap();
        assert_eq!(addr.country, DEFAULT_COUNTRY);
    }
}
