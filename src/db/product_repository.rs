//! Product repository for the mugshop backend.

use chrono::Utc;
use sqlx::{QueryBuilder, SqlitePool};

use super::product::{derive_slug, NewProduct, Product, ProductUpdate};
use crate::{Result, ShopError};

const PRODUCT_COLUMNS: &str = "id, name, slug, description, price, sale_price, category, image,
     in_stock, stock_count, sku, created_at, updated_at";

/// Sort order for product listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    /// Newest first.
    #[default]
    Newest,
    /// Price ascending.
    PriceAsc,
    /// Price descending.
    PriceDesc,
    /// Name A-Z.
    Name,
}

impl ProductSort {
    fn order_clause(&self) -> &'static str {
        match self {
            ProductSort::Newest => "created_at DESC, id DESC",
            ProductSort::PriceAsc => "price ASC, id ASC",
            ProductSort::PriceDesc => "price DESC, id ASC",
            ProductSort::Name => "name COLLATE NOCASE ASC, id ASC",
        }
    }
}

/// Filter for listing products.
#[derive(Debug, Clone, Default)]
pub struct ProductListFilter {
    /// Substring match over name and description.
    pub search: Option<String>,
    /// Only products in this category.
    pub category: Option<String>,
    /// Only products with this stock flag.
    pub in_stock: Option<bool>,
    /// Minimum price, inclusive.
    pub min_price: Option<f64>,
    /// Maximum price, inclusive.
    pub max_price: Option<f64>,
    /// Sort order.
    pub sort: ProductSort,
    /// Skip this many rows.
    pub offset: i64,
    /// Return at most this many rows.
    pub limit: i64,
}

/// Repository for product CRUD operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new ProductRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new product. The slug is derived from the name.
    pub async fn create(&self, new_product: &NewProduct) -> Result<Product> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO products (name, slug, description, price, sale_price, category, image,
                                   in_stock, stock_count, sku, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_product.name)
        .bind(derive_slug(&new_product.name))
        .bind(&new_product.description)
        .bind(new_product.price)
        .bind(new_product.sale_price)
        .bind(&new_product.category)
        .bind(&new_product.image)
        .bind(new_product.in_stock)
        .bind(new_product.stock_count)
        .bind(&new_product.sku)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| ShopError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| ShopError::NotFound("product".to_string()))
    }

    /// Get a product by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Product>> {
        let result = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ShopError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get a product by slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        let result = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE slug = ?"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ShopError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Update a product by ID.
    ///
    /// Only fields that are set in the update will be modified. A name change
    /// re-derives the slug. Returns the updated product, or None if not found.
    pub async fn update(&self, id: i64, update: &ProductUpdate) -> Result<Option<Product>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE products SET ");
        let mut separated = query.separated(", ");

        if let Some(ref name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
            separated.push("slug = ");
            separated.push_bind_unseparated(derive_slug(name));
        }
        if let Some(ref description) = update.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description.clone());
        }
        if let Some(price) = update.price {
            separated.push("price = ");
            separated.push_bind_unseparated(price);
        }
        if let Some(sale_price) = update.sale_price {
            separated.push("sale_price = ");
            separated.push_bind_unseparated(sale_price);
        }
        if let Some(ref category) = update.category {
            separated.push("category = ");
            separated.push_bind_unseparated(category);
        }
        if let Some(ref image) = update.image {
            separated.push("image = ");
            separated.push_bind_unseparated(image.clone());
        }
        if let Some(in_stock) = update.in_stock {
            separated.push("in_stock = ");
            separated.push_bind_unseparated(in_stock);
        }
        if let Some(stock_count) = update.stock_count {
            separated.push("stock_count = ");
            separated.push_bind_unseparated(stock_count);
        }
        if let Some(ref sku) = update.sku {
            separated.push("sku = ");
            separated.push_bind_unseparated(sku.clone());
        }

        separated.push("updated_at = ");
        separated.push_bind_unseparated(Utc::now());

        query.push(" WHERE id = ");
        query.push_bind(id);

        let result = query
            .build()
            .execute(self.pool)
            .await
            .map_err(|e| ShopError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// List products matching the filter.
    pub async fn list(&self, filter: &ProductListFilter) -> Result<Vec<Product>> {
        let mut query = self.filtered_query(filter, PRODUCT_COLUMNS);

        query.push(format!(" ORDER BY {}", filter.sort.order_clause()));
        query.push(" LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.offset);

        let products = query
            .build_query_as::<Product>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| ShopError::Database(e.to_string()))?;

        Ok(products)
    }

    /// Count products matching the filter, ignoring pagination.
    pub async fn count(&self, filter: &ProductListFilter) -> Result<i64> {
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
        filter: &ProductListFilter,
        columns: &str,
    ) -> QueryBuilder<'static, sqlx::Sqlite> {
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT {columns} FROM products WHERE 1=1"));

        if let Some(ref search) = filter.search {
            let pattern = format!("%{}%", search);
            query.push(" AND (name LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR description LIKE ");
            query.push_bind(pattern);
            query.push(")");
        }
        if let Some(ref category) = filter.category {
            query.push(" AND category = ");
            query.push_bind(category.clone());
        }
        if let Some(in_stock) = filter.in_stock {
            query.push(" AND in_stock = ");
            query.push_bind(in_stock);
        }
        if let Some(min_price) = filter.min_price {
            query.push(" AND price >= ");
            query.push_bind(min_price);
        }
        if let Some(max_price) = filter.max_price {
            query.push(" AND price <= ");
            query.push_bind(max_price);
        }

        query
    }

    /// Delete a product by ID.
    ///
    /// Returns true if a product was deleted, false if not found.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| ShopError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }
}
