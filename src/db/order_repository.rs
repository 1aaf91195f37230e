//! Order repository for the mugshop backend.

use chrono::Utc;
use sqlx::{QueryBuilder, SqlitePool};

use super::order::{derive_order_number, NewOrder, Order, OrderStatus};
use crate::{Result, ShopError};

const ORDER_COLUMNS: &str = "id, order_number, customer_name, customer_email, customer_phone,
     shipping_address, items, total, status, tracking_number, notes, created_at, updated_at";

/// Filter for listing orders.
#[derive(Debug, Clone, Default)]
pub struct OrderListFilter {
    /// Only orders with this status.
    pub status: Option<OrderStatus>,
    /// Substring match over order number and customer email.
    pub search: Option<String>,
    /// Skip this many rows.
    pub offset: i64,
    /// Return at most this many rows.
    pub limit: i64,
}

/// Repository for order operations.
pub struct OrderRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new OrderRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new order. The order number and total are derived.
    pub async fn create(&self, new_order: &NewOrder) -> Result<Order> {
        let now = Utc::now();
        let items_json = serde_json::to_string(&new_order.items)
            .map_err(|e| ShopError::Validation(format!("invalid order items: {e}")))?;

        let result = sqlx::query(
            "INSERT INTO orders (order_number, customer_name, customer_email, customer_phone,
                                 shipping_address, items, total, status, notes,
                                 created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(derive_order_number(now))
        .bind(&new_order.customer_name)
        .bind(new_order.customer_email.to_lowercase())
        .bind(&new_order.customer_phone)
        .bind(&new_order.shipping_address)
        .bind(items_json)
        .bind(new_order.total())
        .bind(OrderStatus::Pending.as_str())
        .bind(&new_order.notes)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| ShopError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| ShopError::NotFound("order".to_string()))
    }

    /// Get an order by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Order>> {
        let result = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ShopError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get an order by its order number.
    pub async fn get_by_order_number(&self, order_number: &str) -> Result<Option<Order>> {
        let result = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = ?"
        ))
        .bind(order_number)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ShopError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Update an order's fulfillment status, optionally attaching a tracking
    /// number. Returns the updated order, or None if not found.
    pub async fn update_status(
        &self,
        id: i64,
        status: OrderStatus,
        tracking_number: Option<&str>,
    ) -> Result<Option<Order>> {
        let result = match tracking_number {
            Some(tracking) => sqlx::query(
                "UPDATE orders SET status = ?, tracking_number = ?, updated_at = ? WHERE id = ?",
            )
            .bind(status.as_str())
            .bind(tracking)
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool)
            .await,
            None => sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(Utc::now())
                .bind(id)
                .execute(self.pool)
                .await,
        }
        .map_err(|e| ShopError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// List orders matching the filter, newest first.
    pub async fn list(&self, filter: &OrderListFilter) -> Result<Vec<Order>> {
        let mut query = self.filtered_query(filter, ORDER_COLUMNS);

        query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.offset);

        let orders = query
            .build_query_as::<Order>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| ShopError::Database(e.to_string()))?;

        Ok(orders)
    }

    /// Count orders matching the filter, ignoring pagination.
    pub async fn count(&self, filter: &OrderListFilter) -> Result<i64> {
        let count: (i64,) = self
            .filtered_query(filter, "COUNT(*)")
            .build_query_as()
            .fetch_one(self.pool)
            .await
            .map_err(|e| ShopError::Database(e.to_string()))?;
        Ok(count.0)
    }

    fn filtered_query(
        &self,
        filter: &OrderListFilter,
        columns: &str,
    ) -> QueryBuilder<'static, sqlx::Sqlite> {
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT {columns} FROM orders WHERE 1=1"));

        if let Some(status) = filter.status {
            query.push(" AND status = ");
            query.push_bind(status.as_str().to_string());
        }
        if let Some(ref search) = filter.search {
            let pattern = format!("%{}%", search);
            query.push(" AND (order_number LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR customer_email LIKE ");
            query.push_bind(pattern);
            query.push(")");
        }

        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::order::OrderItem;
    use crate::Database;

    async fn setup_db() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    fn new_order(email: &str) -> NewOrder {
        NewOrder {
            customer_name: "Alice".to_string(),
            customer_email: email.to_string(),
            customer_phone: None,
            shipping_address: "1 Main St".to_string(),
            items: vec![OrderItem {
                product_id: 1,
                name: "Mug".to_string(),
                price: 10.0,
                quantity: 2,
            }],
            notes: None,
        }
    }

    fn filter() -> OrderListFilter {
        OrderListFilter {
            limit: 100,
            ..OrderListFilter::default()
        }
    }

    #[tokio::test]
    async fn test_create_order() {
        let db = setup_db().await;
        let repo = OrderRepository::new(db.pool());

        let order = repo.create(&new_order("alice@example.com")).await.unwrap();

        assert_eq!(order.id, 1);
        assert!(order.order_number.starts_with("ORD-"));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 1);
        assert!((order.total - 20.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_items_roundtrip_through_json_column() {
        let db = setup_db().await;
        let repo = OrderRepository::new(db.pool());

        let mut new = new_order("alice@example.com");
        new.items.push(OrderItem {
            product_id: 2,
            name: "Saucer".to_string(),
            price: 4.5,
            quantity: 3,
        });

        let order = repo.create(&new).await.unwrap();
        let loaded = repo.get_by_id(order.id).await.unwrap().unwrap();

        assert_eq!(loaded.items.len(), 2);
        assert_eq!(loaded.items[1].name, "Saucer");
        assert_eq!(loaded.items[1].quantity, 3);
        assert!((loaded.total - 33.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_get_by_order_number() {
        let db = setup_db().await;
        let repo = OrderRepository::new(db.pool());

        let order = repo.create(&new_order("alice@example.com")).await.unwrap();

        let found = repo
            .get_by_order_number(&order.order_number)
            .await
            .unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().id, order.id);

        assert!(repo
            .get_by_order_number("ORD-00000000-DEADBEEF")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_status() {
        let db = setup_db().await;
        let repo = OrderRepository::new(db.pool());

        let order = repo.create(&new_order("alice@example.com")).await.unwrap();

        let updated = repo
            .update_status(order.id, OrderStatus::Shipped, Some("TRACK123"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Shipped);
        assert_eq!(updated.tracking_number.as_deref(), Some("TRACK123"));

        // Without tracking number the existing one is kept
        let delivered = repo
            .update_status(order.id, OrderStatus::Delivered, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(delivered.tracking_number.as_deref(), Some("TRACK123"));
    }

    #[tokio::test]
    async fn test_update_status_nonexistent() {
        let db = setup_db().await;
        let repo = OrderRepository::new(db.pool());

        let result = repo
            .update_status(999, OrderStatus::Confirmed, None)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let db = setup_db().await;
        let repo = OrderRepository::new(db.pool());

        let a = repo.create(&new_order("a@example.com")).await.unwrap();
        repo.create(&new_order("b@example.com")).await.unwrap();
        repo.update_status(a.id, OrderStatus::Shipped, None)
            .await
            .unwrap();

        let shipped = repo
            .list(&OrderListFilter {
                status: Some(OrderStatus::Shipped),
                ..filter()
            })
            .await
            .unwrap();
        assert_eq!(shipped.len(), 1);
        assert_eq!(shipped[0].id, a.id);

        let pending = repo
            .list(&OrderListFilter {
                status: Some(OrderStatus::Pending),
                ..filter()
            })
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn test_list_search_and_count() {
        let db = setup_db().await;
        let repo = OrderRepository::new(db.pool());

        repo.create(&new_order("alice@example.com")).await.unwrap();
        repo.create(&new_order("bob@example.com")).await.unwrap();

        let results = repo
            .list(&OrderListFilter {
                search: Some("alice".to_string()),
                ..filter()
            })
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].customer_email, "alice@example.com");

        assert_eq!(repo.count(&filter()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let db = setup_db().await;
        let repo = OrderRepository::new(db.pool());

        let first = repo.create(&new_order("a@example.com")).await.unwrap();
        let second = repo.create(&new_order("b@example.com")).await.unwrap();

        let all = repo.list(&filter()).await.unwrap();
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
    }
}
