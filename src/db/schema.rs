//! Database schema and migrations for the mugshop backend.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Initial schema - users table with account-security columns
    r#"
-- Users table for authentication, staff, and customer accounts
CREATE TABLE users (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    email            TEXT NOT NULL UNIQUE,
    password         TEXT NOT NULL,           -- Argon2 hash
    name             TEXT NOT NULL,
    phone            TEXT,
    role             TEXT NOT NULL DEFAULT 'customer',  -- 'admin', 'staff', 'readonly', 'customer'
    failed_attempts  INTEGER NOT NULL DEFAULT 0,
    last_failed_at   TEXT,
    locked_until     TEXT,
    last_login       TEXT,
    created_at       TEXT NOT NULL,
    is_active        INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX idx_users_email ON users(email);
CREATE INDEX idx_users_role ON users(role);
"#,
    // v2: Products table
    r#"
-- Products catalog
CREATE TABLE products (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    slug        TEXT NOT NULL UNIQUE,
    description TEXT,
    price       REAL NOT NULL,
    sale_price  REAL,
    category    TEXT NOT NULL,
    image       TEXT,
    in_stock    INTEGER NOT NULL DEFAULT 1,
    stock_count INTEGER NOT NULL DEFAULT 0,
    sku         TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX idx_products_slug ON products(slug);
CREATE INDEX idx_products_category ON products(category);
"#,
    // v3: Orders table; line items are stored as a JSON column
    r#"
-- Customer orders
CREATE TABLE orders (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    order_number     TEXT NOT NULL UNIQUE,
    customer_name    TEXT NOT NULL,
    customer_email   TEXT NOT NULL,
    customer_phone   TEXT,
    shipping_address TEXT NOT NULL,
    items            TEXT NOT NULL,           -- JSON array of line items
    total            REAL NOT NULL,
    status           TEXT NOT NULL DEFAULT 'pending',
    tracking_number  TEXT,
    notes            TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE INDEX idx_orders_order_number ON orders(order_number);
CREATE INDEX idx_orders_status ON orders(status);
CREATE INDEX idx_orders_customer_email ON orders(customer_email);
"#,
];
