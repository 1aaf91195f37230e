//! Typed query-string DTOs for list endpoints.
//!
//! Each query struct converts into the repository's filter type, clamping
//! pagination to sane bounds so a client cannot request unbounded pages.

use serde::Deserialize;

use crate::db::order::OrderStatus;
use crate::db::order_repository::OrderListFilter;
use crate::db::product_repository::{ProductListFilter, ProductSort};
use crate::db::user_repository::UserListFilter;
use crate::db::Role;

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

fn clamp_page(page: Option<i64>) -> i64 {
    page.unwrap_or(1).max(1)
}

fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Pagination computed from a page/limit pair.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    fn from_query(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: clamp_page(page),
            limit: clamp_limit(limit),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Query parameters for `GET /api/products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub in_stock: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// One of: newest, price_asc, price_desc, name.
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ProductListQuery {
    /// Convert to a repository filter plus pagination info.
    pub fn into_filter(self) -> (ProductListFilter, Pagination) {
        let pagination = Pagination::from_query(self.page, self.limit);
        let sort = match self.sort.as_deref() {
            Some("price_asc") => ProductSort::PriceAsc,
            Some("price_desc") => ProductSort::PriceDesc,
            Some("name") => ProductSort::Name,
            _ => ProductSort::Newest,
        };

        let filter = ProductListFilter {
            search: self.search,
            category: self.category,
            in_stock: self.in_stock,
            min_price: self.min_price,
            max_price: self.max_price,
            sort,
            offset: pagination.offset(),
            limit: pagination.limit,
        };
        (filter, pagination)
    }
}

/// Query parameters for `GET /api/orders`.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    /// One of: pending, confirmed, shipped, delivered, cancelled.
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl OrderListQuery {
    /// Convert to a repository filter plus pagination info.
    ///
    /// An unknown status string is rejected by the handler before this runs;
    /// here it simply parses to None.
    pub fn into_filter(self) -> (OrderListFilter, Pagination) {
        let pagination = Pagination::from_query(self.page, self.limit);
        let status = self.status.and_then(|s| s.parse::<OrderStatus>().ok());

        let filter = OrderListFilter {
            status,
            search: self.search,
            offset: pagination.offset(),
            limit: pagination.limit,
        };
        (filter, pagination)
    }
}

/// Query parameters for `GET /api/users`.
#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub search: Option<String>,
    /// One of: admin, staff, readonly, customer.
    pub role: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl UserListQuery {
    /// Convert to a repository filter plus pagination info.
    pub fn into_filter(self) -> (UserListFilter, Pagination) {
        let pagination = Pagination::from_query(self.page, self.limit);
        let role = self.role.and_then(|r| r.parse::<Role>().ok());

        let filter = UserListFilter {
            search: self.search,
            role,
            offset: pagination.offset(),
            limit: pagination.limit,
        };
        (filter, pagination)
    }
}

/// Query parameters for `GET /api/admin/audit`.
#[derive(Debug, Default, Deserialize)]
pub struct AuditListQuery {
    pub actor_id: Option<i64>,
    pub action: Option<String>,
    pub resource: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl AuditListQuery {
    /// Convert to an audit store filter plus pagination info.
    pub fn into_filter(self) -> (crate::audit::AuditFilter, Pagination) {
        let pagination = Pagination::from_query(self.page, self.limit);

        let filter = crate::audit::AuditFilter {
            actor_id: self.actor_id,
            action: self.action,
            resource: self.resource,
            offset: pagination.offset() as usize,
            limit: pagination.limit as usize,
        };
        (filter, pagination)
    }
}
