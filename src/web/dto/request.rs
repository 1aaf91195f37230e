//! Request DTOs for the mugshop API.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::product::ProductUpdate;
use crate::db::order::OrderItem;
use crate::db::Role;

/// Login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Password (plaintext; checked against the stored hash).
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Customer self-registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Password (checked against the configured policy).
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Display name.
    #[validate(custom(function = "super::validation::not_empty_trimmed"))]
    #[validate(length(max = 100, message = "Name is too long"))]
    pub name: String,
    /// Phone number (optional).
    #[validate(length(max = 32, message = "Phone number is too long"))]
    pub phone: Option<String>,
}

/// Profile update request for the authenticated account.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    /// New display name.
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    /// New phone number.
    #[validate(length(max = 32, message = "Phone number is too long"))]
    pub phone: Option<String>,
}

/// Password change request.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    /// Current password, re-verified before the change.
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    /// New password (checked against the configured policy).
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// Product creation request (admin/staff).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    /// Product name; the slug is derived from it.
    #[validate(custom(function = "super::validation::not_empty_trimmed"))]
    #[validate(length(max = 200, message = "Name is too long"))]
    pub name: String,
    /// Description text.
    pub description: Option<String>,
    /// Regular price.
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: f64,
    /// Discounted price.
    #[validate(range(min = 0.0, message = "Sale price must not be negative"))]
    pub sale_price: Option<f64>,
    /// Category label.
    #[validate(custom(function = "super::validation::not_empty_trimmed"))]
    pub category: String,
    /// Image URL.
    pub image: Option<String>,
    /// Whether the product is purchasable (defaults to true).
    pub in_stock: Option<bool>,
    /// Units on hand (defaults to 0).
    #[validate(range(min = 0, message = "Stock count must not be negative"))]
    pub stock_count: Option<i64>,
    /// Stock keeping unit.
    pub sku: Option<String>,
}

/// Product update request (admin/staff). Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: Option<f64>,
    #[validate(range(min = 0.0, message = "Sale price must not be negative"))]
    pub sale_price: Option<f64>,
    #[validate(length(min = 1, message = "Category must not be empty"))]
    pub category: Option<String>,
    pub image: Option<String>,
    pub in_stock: Option<bool>,
    #[validate(range(min = 0, message = "Stock count must not be negative"))]
    pub stock_count: Option<i64>,
    pub sku: Option<String>,
}

impl UpdateProductRequest {
    /// Convert into a repository update. Present fields are set; fields
    /// absent from the request are left unchanged.
    pub fn into_update(self) -> ProductUpdate {
        ProductUpdate {
            name: self.name,
            description: self.description.map(Some),
            price: self.price,
            sale_price: self.sale_price.map(Some),
            category: self.category,
            image: self.image.map(Some),
            in_stock: self.in_stock,
            stock_count: self.stock_count,
            sku: self.sku.map(Some),
        }
    }
}

/// A line item within a checkout request.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct OrderItemRequest {
    /// Product id.
    pub product_id: i64,
    /// Quantity ordered.
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i64,
}

/// Checkout request (public storefront).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(custom(function = "super::validation::not_empty_trimmed"))]
    #[validate(length(max = 100, message = "Name is too long"))]
    pub customer_name: String,
    #[validate(email(message = "Invalid email address"))]
    pub customer_email: String,
    #[validate(length(max = 32, message = "Phone number is too long"))]
    pub customer_phone: Option<String>,
    #[validate(custom(function = "super::validation::not_empty_trimmed"))]
    pub shipping_address: String,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    #[validate(nested)]
    pub items: Vec<OrderItemRequest>,
    pub notes: Option<String>,
}

/// Order status update request (admin/staff).
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrderStatusRequest {
    /// New status: pending, confirmed, shipped, delivered, or cancelled.
    #[validate(length(min = 1, message = "Status is required"))]
    pub status: String,
    /// Carrier tracking number.
    pub tracking_number: Option<String>,
}

/// Account creation request (admin only).
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[validate(custom(function = "super::validation::not_empty_trimmed"))]
    #[validate(length(max = 100, message = "Name is too long"))]
    pub name: String,
    #[validate(length(max = 32, message = "Phone number is too long"))]
    pub phone: Option<String>,
    /// Role; defaults to customer when absent.
    pub role: Option<Role>,
}

/// Account update request (admin only). Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 32, message = "Phone number is too long"))]
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl CreateOrderRequest {
    /// Pair request items with catalog data into order line items.
    ///
    /// `resolve` maps a product id to (name, effective price). Items whose
    /// product cannot be resolved yield None upstream and fail the checkout.
    pub fn to_items(&self, resolve: impl Fn(i64) -> Option<(String, f64)>) -> Option<Vec<OrderItem>> {
        self.items
            .iter()
            .map(|item| {
                resolve(item.product_id).map(|(name, price)| OrderItem {
                    product_id: item.product_id,
                    name,
                    price,
                    quantity: item.quantity,
                })
            })
            .collect()
    }
}
