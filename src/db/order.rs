//! Order model for the mugshop backend.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

/// Derive a human-readable order number.
///
/// Format: `ORD-<yyyymmdd>-<8 hex chars>`. The random suffix keeps numbers
/// unguessable; the date prefix keeps them sortable at a glance.
pub fn derive_order_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("ORD-{}-{}", now.format("%Y%m%d"), &suffix[..8].to_uppercase())
}

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Convert status to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("unknown order status: {s}")),
        }
    }
}

/// A single line item within an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product id at order time.
    pub product_id: i64,
    /// Product name at order time (orders keep their own copy).
    pub name: String,
    /// Unit price at order time.
    pub price: f64,
    /// Quantity ordered.
    pub quantity: i64,
}

impl OrderItem {
    /// Line total for this item.
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

/// A customer order.
///
/// Line items are stored as a JSON column; they snapshot product data at
/// order time so later catalog edits never change past orders.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    /// Unique id.
    pub id: i64,
    /// Human-readable order number.
    pub order_number: String,
    /// Customer name.
    pub customer_name: String,
    /// Customer email.
    pub customer_email: String,
    /// Customer phone (optional).
    pub customer_phone: Option<String>,
    /// Shipping address.
    pub shipping_address: String,
    /// Line items.
    pub items: Vec<OrderItem>,
    /// Order total.
    pub total: f64,
    /// Fulfillment status.
    pub status: OrderStatus,
    /// Carrier tracking number (optional).
    pub tracking_number: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl sqlx::FromRow<'_, SqliteRow> for Order {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let status_str: String = row.try_get("status")?;
        let status = status_str
            .parse()
            .map_err(|e: String| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: e.into(),
            })?;

        let items_json: String = row.try_get("items")?;
        let items = serde_json::from_str(&items_json).map_err(|e| sqlx::Error::ColumnDecode {
            index: "items".to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            id: row.try_get("id")?,
            order_number: row.try_get("order_number")?,
            customer_name: row.try_get("customer_name")?,
            customer_email: row.try_get("customer_email")?,
            customer_phone: row.try_get("customer_phone")?,
            shipping_address: row.try_get("shipping_address")?,
            items,
            total: row.try_get("total")?,
            status,
            tracking_number: row.try_get("tracking_number")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Data for creating a new order. The order number and total are derived.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: String,
    pub items: Vec<OrderItem>,
    pub notes: Option<String>,
}

impl NewOrder {
    /// Order total: sum of line totals.
    pub fn total(&self) -> f64 {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}
