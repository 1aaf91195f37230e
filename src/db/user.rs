//! User model for the mugshop backend.
//!
//! Defines the Identity struct and Role enum for account management.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Account role for permission management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access.
    Admin,
    /// Store staff: product and order management.
    Staff,
    /// Read-only back-office access.
    #[serde(rename = "readonly")]
    ReadOnly,
    /// Storefront customer.
    #[default]
    Customer,
}

impl Role {
    /// Convert role to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::ReadOnly => "readonly",
            Role::Customer => "customer",
        }
    }

    /// All back-office roles, i.e. everything except customers.
    pub fn is_back_office(&self) -> bool {
        !matches!(self, Role::Customer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            "readonly" => Ok(Role::ReadOnly),
            "customer" => Ok(Role::Customer),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// A registered account: staff or customer.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Unique id.
    pub id: i64,
    /// Email address, stored lowercase and unique.
    pub email: String,
    /// Password hash (Argon2 PHC string).
    pub password: String,
    /// Display name.
    pub name: String,
    /// Phone number (optional).
    pub phone: Option<String>,
    /// Role for permissions.
    pub role: Role,
    /// Consecutive failed login attempts.
    pub failed_attempts: i64,
    /// When the last failed attempt happened.
    pub last_failed_at: Option<DateTime<Utc>>,
    /// Lock expiry; NULL means not locked.
    pub locked_until: Option<DateTime<Utc>>,
    /// Last successful login.
    pub last_login: Option<DateTime<Utc>>,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Whether the account is active.
    pub is_active: bool,
}

impl sqlx::FromRow<'_, SqliteRow> for Identity {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let role_str: String = row.try_get("role")?;
        let role = role_str
            .parse()
            .map_err(|e: String| sqlx::Error::ColumnDecode {
                index: "role".to_string(),
                source: e.into(),
            })?;

        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password: row.try_get("password")?,
            name: row.try_get("name")?,
            phone: row.try_get("phone")?,
            role,
            failed_attempts: row.try_get("failed_attempts")?,
            last_failed_at: row.try_get("last_failed_at")?,
            locked_until: row.try_get("locked_until")?,
            last_login: row.try_get("last_login")?,
            created_at: row.try_get("created_at")?,
            is_active: row.try_get("is_active")?,
        })
    }
}

/// Data for creating a new account.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    /// Email address (will be stored lowercase).
    pub email: String,
    /// Password hash (should be pre-hashed with Argon2).
    pub password: String,
    /// Display name.
    pub name: String,
    /// Phone number (optional).
    pub phone: Option<String>,
    /// Role (defaults to Customer).
    pub role: Role,
}

impl NewIdentity {
    /// Create a new account with minimal required fields.
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            name: name.into(),
            phone: None,
            role: Role::Customer,
        }
    }

    /// Set the phone number.
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Set the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Data for updating an existing account.
///
/// Only fields that are set will be modified.
#[derive(Debug, Clone, Default)]
pub struct IdentityUpdate {
    /// New email address.
    pub email: Option<String>,
    /// New password hash (if changing password).
    pub password: Option<String>,
    /// New display name.
    pub name: Option<String>,
    /// New phone number.
    pub phone: Option<Option<String>>,
    /// New role.
    pub role: Option<Role>,
    /// New active status.
    pub is_active: Option<bool>,
}

impl IdentityUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set new email.
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set new password hash.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set new display name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set new phone number.
    pub fn phone(mut self, phone: Option<String>) -> Self {
        self.phone = Some(phone);
        self
    }

    /// Set new role.
    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// Set active status.
    pub fn is_active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    /// Check if any fields are set.
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password.is_none()
            && self.name.is_none()
            && self.phone.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::Staff.as_str(), "staff");
        assert_eq!(Role::ReadOnly.as_str(), "readonly");
        assert_eq!(Role::Customer.as_str(), "customer");
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("STAFF".parse::<Role>().unwrap(), Role::Staff);
        assert_eq!("readonly".parse::<Role>().unwrap(), Role::ReadOnly);
        assert_eq!("customer".parse::<Role>().unwrap(), Role::Customer);
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_display_roundtrip() {
        for role in [Role::Admin, Role::Staff, Role::ReadOnly, Role::Customer] {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_default() {
        assert_eq!(Role::default(), Role::Customer);
    }

    #[test]
    fn test_role_back_office() {
        assert!(Role::Admin.is_back_office());
        assert!(Role::Staff.is_back_office());
        assert!(Role::ReadOnly.is_back_office());
        assert!(!Role::Customer.is_back_office());
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::ReadOnly).unwrap(), "\"readonly\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"admin\"").unwrap(),
            Role::Admin
        );
    }

    #[test]
    fn test_new_identity_defaults() {
        let new = NewIdentity::new("a@mugshop.com", "hash", "A");
        assert_eq!(new.role, Role::Customer);
        assert!(new.phone.is_none());

        let admin = NewIdentity::new("b@mugshop.com", "hash", "B")
            .with_role(Role::Admin)
            .with_phone("555-0100");
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.phone.as_deref(), Some("555-0100"));
    }

    #[test]
    fn test_identity_update_is_empty() {
        assert!(IdentityUpdate::new().is_empty());
        assert!(!IdentityUpdate::new().name("X").is_empty());
        assert!(!IdentityUpdate::new().phone(None).is_empty());
    }
}
