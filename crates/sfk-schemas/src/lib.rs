use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment status of an order, stored as a one-character code. The set is
/// flat: any status may be set by a privileged caller at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "P")]
    Pending,
    #[serde(rename = "C")]
    Complete,
    #[serde(rename = "F")]
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "P",
            PaymentStatus::Complete => "C",
            PaymentStatus::Failed => "F",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "P" => Some(PaymentStatus::Pending),
            "C" => Some(PaymentStatus::Complete),
            "F" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

/// Customer membership tier, one-character code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Membership {
    #[serde(rename = "B")]
    Bronze,
    #[serde(rename = "S")]
    Silver,
    #[serde(rename = "G")]
    Gold,
}

impl Membership {
    pub fn as_str(&self) -> &'static str {
        match self {
            Membership::Bronze => "B",
            Membership::Silver => "S",
            Membership::Gold => "G",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "B" => Some(Membership::Bronze),
            "S" => Some(Membership::Silver),
            "G" => Some(Membership::Gold),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub product_id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub unit_price: Decimal,
    pub inventory: i32,
    pub last_update: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: i64,
    pub user_id: i64,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub membership: Membership,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub cart_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub cart_item_id: i64,
    pub cart_id: Uuid,
    pub product_id: i64,
    pub quantity: i32,
}

/// One cart row joined with the *live* catalog price. Carts store no price;
/// the line total always reflects the price at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub cart_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub items: Vec<CartLine>,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: i64,
    pub customer_id: i64,
    pub placed_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub order_item_id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    /// Unit price captured when the order was placed. Never re-read from the
    /// catalog; historical orders reflect the price paid.
    pub unit_price: Decimal,
}

/// One order row with its snapshotted price. `total_price` is
/// quantity x snapshotted unit price, not the current catalog price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: i64,
    pub title: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub order_id: i64,
    pub customer_id: i64,
    pub placed_at: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub items: Vec<OrderLine>,
    pub total_price: Decimal,
}

/// Emitted after a cart has been converted and the transaction committed.
/// Delivery is best-effort; consumers must be idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order_id: i64,
    pub customer_id: i64,
    pub placed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_status_round_trips_through_codes() {
        for st in [
            PaymentStatus::Pending,
            PaymentStatus::Complete,
            PaymentStatus::Failed,
        ] {
            assert_eq!(PaymentStatus::parse(st.as_str()), Some(st));
        }
        assert_eq!(PaymentStatus::parse("X"), None);
    }

    #[test]
    fn membership_round_trips_through_codes() {
        for m in [Membership::Bronze, Membership::Silver, Membership::Gold] {
            assert_eq!(Membership::parse(m.as_str()), Some(m));
        }
        assert_eq!(Membership::parse(""), None);
    }

    #[test]
    fn payment_status_serializes_as_code() {
        let s = serde_json::to_string(&PaymentStatus::Pending).unwrap();
        assert_eq!(s, "\"P\"");
    }
}
