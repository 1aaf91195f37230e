//! Database layer for the mugshop backend.
//!
//! SQLite via sqlx. Migrations are applied sequentially when the database is
//! opened; the schema_version table tracks which have run.

pub mod order;
pub mod order_repository;
pub mod product;
pub mod product_repository;
pub mod schema;
pub mod user;
pub mod user_repository;

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::{Result, ShopError};

pub use order::{Order, OrderItem, OrderStatus};
pub use order_repository::{OrderListFilter, OrderRepository};
pub use product::{Product, ProductUpdate};
pub use product_repository::{ProductListFilter, ProductRepository, ProductSort};
pub use user::{Identity, IdentityUpdate, NewIdentity, Role};
pub use user_repository::{UserListFilter, UserRepository};

/// Database handle wrapping a sqlx connection pool.
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) a database file and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| ShopError::Database(e.to_string()))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Open an in-memory database (for tests) and apply all migrations.
    ///
    /// The pool is capped at one connection; every connection to
    /// `sqlite::memory:` is otherwise a separate empty database.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| ShopError::Database(e.to_string()))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Apply any migrations newer than the recorded schema version.
    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version    INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| ShopError::Database(e.to_string()))?;

        let current: (Option<i64>,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ShopError::Database(e.to_string()))?;
        let current = current.0.unwrap_or(0);

        for (i, migration) in schema::MIGRATIONS.iter().enumerate() {
            let version = (i + 1) as i64;
            if version <= current {
                continue;
            }

            sqlx::raw_sql(migration)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    ShopError::Database(format!("migration v{version} failed: {e}"))
                })?;

            sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
                .bind(version)
                .execute(&self.pool)
                .await
                .map_err(|e| ShopError::Database(e.to_string()))?;

            tracing::info!("applied database migration v{}", version);
        }

        Ok(())
    }

    /// The applied schema version.
    pub async fn schema_version(&self) -> Result<i64> {
        let version: (Option<i64>,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ShopError::Database(e.to_string()))?;
        Ok(version.0.unwrap_or(0))
    }

    /// Create the default admin account if no admin exists yet.
    ///
    /// Returns true if an account was created. `password_hash` must already
    /// be an Argon2 PHC string.
    pub async fn ensure_admin(&self, email: &str, password_hash: &str) -> Result<bool> {
        let admins: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'admin'")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| ShopError::Database(e.to_string()))?;

        if admins.0 > 0 {
            return Ok(false);
        }

        let repo = UserRepository::new(&self.pool);
        repo.create(
            &NewIdentity::new(email, password_hash, "Administrator").with_role(Role::Admin),
        )
        .await?;

        tracing::info!("created default admin account {}", email);
        Ok(true)
    }

    /// Access the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
