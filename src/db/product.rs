//! Product model for the mugshop backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derive a URL slug from a product name.
///
/// Lowercases, replaces runs of non-alphanumeric characters with a single
/// hyphen, and trims leading/trailing hyphens. Applied on the write path
/// whenever the name changes, so slugs never drift from names silently.
pub fn derive_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true; // suppress a leading hyphen

    for c in name.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    slug.trim_end_matches('-').to_string()
}

/// A catalog product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    /// Unique id.
    pub id: i64,
    /// Product name.
    pub name: String,
    /// URL slug, derived from the name.
    pub slug: String,
    /// Description text.
    pub description: Option<String>,
    /// Regular price.
    pub price: f64,
    /// Discounted price, if on sale.
    pub sale_price: Option<f64>,
    /// Category label.
    pub category: String,
    /// Image URL.
    pub image: Option<String>,
    /// Whether the product is purchasable.
    pub in_stock: bool,
    /// Units on hand.
    pub stock_count: i64,
    /// Stock keeping unit (optional).
    pub sku: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Data for creating a new product. The slug is derived from the name.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub sale_price: Option<f64>,
    pub category: String,
    pub image: Option<String>,
    pub in_stock: bool,
    pub stock_count: i64,
    pub sku: Option<String>,
}

impl NewProduct {
    /// Create a new product with minimal required fields.
    pub fn new(name: impl Into<String>, price: f64, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
            sale_price: None,
            category: category.into(),
            image: None,
            in_stock: true,
            stock_count: 0,
            sku: None,
        }
    }
}

/// Data for updating an existing product.
///
/// Only fields that are set will be modified. Changing the name also
/// re-derives the slug.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub price: Option<f64>,
    pub sale_price: Option<Option<f64>>,
    pub category: Option<String>,
    pub image: Option<Option<String>>,
    pub in_stock: Option<bool>,
    pub stock_count: Option<i64>,
    pub sku: Option<Option<String>>,
}

impl ProductUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.sale_price.is_none()
            && self.category.is_none()
            && self.image.is_none()
            && self.in_stock.is_none()
            && self.stock_count.is_none()
            && self.sku.is_none()
    }
}
