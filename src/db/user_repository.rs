//! User repository for the mugshop backend.
//!
//! CRUD operations plus the persisted side of the account lockout machine.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, SqlitePool};

use super::user::{Identity, IdentityUpdate, NewIdentity, Role};
use crate::auth::{LockState, LockoutPolicy};
use crate::{Result, ShopError};

const IDENTITY_COLUMNS: &str = "id, email, password, name, phone, role, failed_attempts,
     last_failed_at, locked_until, last_login, created_at, is_active";

/// Filter for listing accounts.
#[derive(Debug, Clone, Default)]
pub struct UserListFilter {
    /// Substring match over name and email.
    pub search: Option<String>,
    /// Only accounts with this role.
    pub role: Option<Role>,
    /// Skip this many rows.
    pub offset: i64,
    /// Return at most this many rows.
    pub limit: i64,
}

/// Repository for account CRUD and login bookkeeping.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new UserRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new account. The email is stored lowercase.
    ///
    /// Returns the created account with the assigned ID.
    pub async fn create(&self, new_identity: &NewIdentity) -> Result<Identity> {
        let result = sqlx::query(
            "INSERT INTO users (email, password, name, phone, role, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(new_identity.email.to_lowercase())
        .bind(&new_identity.password)
        .bind(&new_identity.name)
        .bind(&new_identity.phone)
        .bind(new_identity.role.as_str())
        .bind(Utc::now())
        .execute(self.pool)
        .await
        .map_err(|e| ShopError::Database(e.to_string()))?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| ShopError::NotFound("user".to_string()))
    }

    /// Get an account by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Identity>> {
        let result = sqlx::query_as::<_, Identity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ShopError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get an account by email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> Result<Option<Identity>> {
        let result = sqlx::query_as::<_, Identity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM users WHERE email = ? COLLATE NOCASE"
        ))
        .bind(email.to_lowercase())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| ShopError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Update an account by ID.
    ///
    /// Only fields that are set in the update will be modified.
    /// Returns the updated account, or None if not found.
    pub async fn update(&self, id: i64, update: &IdentityUpdate) -> Result<Option<Identity>> {
        if update.is_empty() {
            return self.get_by_id(id).await;
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("UPDATE users SET ");
        let mut separated = query.separated(", ");

        if let Some(ref email) = update.email {
            separated.push("email = ");
            separated.push_bind_unseparated(email.to_lowercase());
        }
        if let Some(ref password) = update.password {
            separated.push("password = ");
            separated.push_bind_unseparated(password);
        }
        if let Some(ref name) = update.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
        }
        if let Some(ref phone) = update.phone {
            separated.push("phone = ");
            separated.push_bind_unseparated(phone.clone());
        }
        if let Some(role) = update.role {
            separated.push("role = ");
            separated.push_bind_unseparated(role.as_str().to_string());
        }
        if let Some(is_active) = update.is_active {
            separated.push("is_active = ");
            separated.push_bind_unseparated(is_active);
        }

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

    /// Record a failed login attempt and return the resulting lock state.
    ///
    /// The transition is computed from a fresh row read inside a transaction
    /// so concurrent failures cannot both observe a stale counter.
    pub async fn record_login_failure(
        &self,
        id: i64,
        policy: &LockoutPolicy,
        now: DateTime<Utc>,
    ) -> Result<LockState> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| ShopError::Database(e.to_string()))?;

        let row: Option<(i64, Option<DateTime<Utc>>, Option<DateTime<Utc>>)> = sqlx::query_as(
            "SELECT failed_attempts, last_failed_at, locked_until FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| ShopError::Database(e.to_string()))?;

        let (failed_attempts, last_failed_at, locked_until) =
            row.ok_or_else(|| ShopError::NotFound("user".to_string()))?;

        let state = policy.on_failure(failed_attempts as u32, last_failed_at, locked_until, now);

        sqlx::query(
            "UPDATE users SET failed_attempts = ?, last_failed_at = ?, locked_until = ?
             WHERE id = ?",
        )
        .bind(state.attempts() as i64)
        .bind(now)
        .bind(state.locked_until())
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| ShopError::Database(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| ShopError::Database(e.to_string()))?;

        Ok(state)
    }

    /// Record a successful login: reset the failure counter, clear any lock,
    /// and stamp last_login.
    pub async fn record_login_success(&self, id: i64, now: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "UPDATE users SET failed_attempts = 0, last_failed_at = NULL, locked_until = NULL,
                    last_login = ? WHERE id = ?",
        )
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await
        .map_err(|e| ShopError::Database(e.to_string()))?;
        Ok(())
    }

    /// List accounts matching the filter, newest first.
    pub async fn list(&self, filter: &UserListFilter) -> Result<Vec<Identity>> {
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new(format!("SELECT {IDENTITY_COLUMNS} FROM users WHERE 1=1"));

        if let Some(ref search) = filter.search {
            let pattern = format!("%{}%", search);
            query.push(" AND (name LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR email LIKE ");
            query.push_bind(pattern);
            query.push(")");
        }
        if let Some(role) = filter.role {
            query.push(" AND role = ");
            query.push_bind(role.as_str().to_string());
        }

        query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.offset);

        let users = query
            .build_query_as::<Identity>()
            .fetch_all(self.pool)
            .await
            .map_err(|e| ShopError::Database(e.to_string()))?;

        Ok(users)
    }

    /// Count accounts matching the filter, ignoring pagination.
    pub async fn count(&self, filter: &UserListFilter) -> Result<i64> {
        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1=1");

        if let Some(ref search) = filter.search {
            let pattern = format!("%{}%", search);
            query.push(" AND (name LIKE ");
            query.push_bind(pattern.clone());
            query.push(" OR email LIKE ");
            query.push_bind(pattern);
            query.push(")");
        }
        if let Some(role) = filter.role {
            query.push(" AND role = ");
            query.push_bind(role.as_str().to_string());
        }

        let count: (i64,) = query
            .build_query_as()
            .fetch_one(self.pool)
            .await
            .map_err(|e| ShopError::Database(e.to_string()))?;
        Ok(count.0)
    }

    /// Delete an account by ID.
    ///
    /// Returns true if an account was deleted, false if not found.
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| ShopError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Check if an email is already taken (case-insensitive).
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE email = ? COLLATE NOCASE)")
                .bind(email.to_lowercase())
                .fetch_one(self.pool)
                .await
                .map_err(|e| ShopError::Database(e.to_string()))?;
        Ok(exists.0)
    }
}
