//! Configuration module for the mugshop backend.

use serde::Deserialize;
use std::path::Path;

use crate::{Result, ShopError};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins. Empty = permissive (development).
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/mugshop.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/mugshop.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// JWT and session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Signing secret (must be set; see `MUGSHOP_JWT_SECRET`).
    #[serde(default)]
    pub secret: String,
    /// Expected token issuer.
    #[serde(default = "default_jwt_issuer")]
    pub issuer: String,
    /// Expected token audience.
    #[serde(default = "default_jwt_audience")]
    pub audience: String,
    /// Maximum session age in seconds (token expiry and the independent
    /// session-age check both derive from this).
    #[serde(default = "default_session_max_age")]
    pub session_max_age_secs: u64,
}

fn default_jwt_issuer() -> String {
    "mugshop-admin".to_string()
}

fn default_jwt_audience() -> String {
    "mugshop-admin-panel".to_string()
}

fn default_session_max_age() -> u64 {
    4 * 60 * 60 // 4 hours
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: default_jwt_issuer(),
            audience: default_jwt_audience(),
            session_max_age_secs: default_session_max_age(),
        }
    }
}

/// Account lockout configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LockoutConfig {
    /// Failed attempts before the account locks.
    #[serde(default = "default_lockout_max_attempts")]
    pub max_attempts: u32,
    /// Lock duration in seconds once the threshold is reached.
    #[serde(default = "default_lockout_duration")]
    pub lockout_duration_secs: u64,
    /// Idle window after which the failed-attempt counter decays back to zero.
    #[serde(default = "default_reset_attempts_after")]
    pub reset_attempts_after_secs: u64,
}

fn default_lockout_max_attempts() -> u32 {
    5
}

fn default_lockout_duration() -> u64 {
    2 * 60 * 60 // 2 hours
}

fn default_reset_attempts_after() -> u64 {
    15 * 60 // 15 minutes
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_lockout_max_attempts(),
            lockout_duration_secs: default_lockout_duration(),
            reset_attempts_after_secs: default_reset_attempts_after(),
        }
    }
}

/// A single fixed-window rate limit: at most `max` requests per `window_secs`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateWindow {
    /// Window duration in seconds.
    pub window_secs: u64,
    /// Maximum requests per window.
    pub max: u32,
}

/// Rate limiting configuration, one window per route class.
///
/// All three classes apply simultaneously; the most restrictive wins.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Applied to every request.
    #[serde(default = "default_global_window")]
    pub global: RateWindow,
    /// Applied to the admin subtree.
    #[serde(default = "default_admin_window")]
    pub admin: RateWindow,
    /// Applied to the login endpoint.
    #[serde(default = "default_login_window")]
    pub login: RateWindow,
}

fn default_global_window() -> RateWindow {
    RateWindow {
        window_secs: 15 * 60,
        max: 100,
    }
}

fn default_admin_window() -> RateWindow {
    RateWindow {
        window_secs: 15 * 60,
        max: 50,
    }
}

fn default_login_window() -> RateWindow {
    RateWindow {
        window_secs: 15 * 60,
        max: 5,
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global: default_global_window(),
            admin: default_admin_window(),
            login: default_login_window(),
        }
    }
}

/// Password policy configuration.
///
/// `max_age_days` and `history_count` are recognized options but are not
/// enforced by the login or password-change flow.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordPolicyConfig {
    /// Minimum password length.
    #[serde(default = "default_password_min_length")]
    pub min_length: usize,
    /// Require at least one uppercase letter.
    #[serde(default = "default_true")]
    pub require_uppercase: bool,
    /// Require at least one lowercase letter.
    #[serde(default = "default_true")]
    pub require_lowercase: bool,
    /// Require at least one digit.
    #[serde(default = "default_true")]
    pub require_numbers: bool,
    /// Require at least one non-alphanumeric character.
    #[serde(default = "default_true")]
    pub require_special_chars: bool,
    /// Password maximum age in days (declared, not enforced).
    #[serde(default = "default_password_max_age")]
    pub max_age_days: u32,
    /// Number of previous passwords remembered (declared, not enforced).
    #[serde(default = "default_password_history")]
    pub history_count: u32,
}

fn default_password_min_length() -> usize {
    8
}

fn default_true() -> bool {
    true
}

fn default_password_max_age() -> u32 {
    90
}

fn default_password_history() -> u32 {
    5
}

impl Default for PasswordPolicyConfig {
    fn default() -> Self {
        Self {
            min_length: default_password_min_length(),
            require_uppercase: true,
            require_lowercase: true,
            require_numbers: true,
            require_special_chars: true,
            max_age_days: default_password_max_age(),
            history_count: default_password_history(),
        }
    }
}

/// Security configuration grouping.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SecurityConfig {
    /// JWT / session settings.
    #[serde(default)]
    pub jwt: JwtConfig,
    /// Account lockout settings.
    #[serde(default)]
    pub lockout: LockoutConfig,
    /// Rate limiting settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Password policy settings.
    #[serde(default)]
    pub password: PasswordPolicyConfig,
}

/// Audit log configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Whether audit recording is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Retention: oldest entries are pruned beyond this count.
    #[serde(default = "default_audit_max_entries")]
    pub max_entries: usize,
}

fn default_audit_max_entries() -> usize {
    10_000
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_audit_max_entries(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Security configuration.
    #[serde(default)]
    pub security: SecurityConfig,
    /// Audit configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ShopError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| ShopError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `MUGSHOP_JWT_SECRET`: Override the JWT signing secret
    pub fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("MUGSHOP_JWT_SECRET") {
            if !secret.is_empty() {
                self.security.jwt.secret = secret;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.security.jwt.secret.is_empty() {
            return Err(ShopError::Config(
                "jwt secret is not set. Set [security.jwt] secret in config.toml \
                 or the MUGSHOP_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.security.lockout.max_attempts == 0 {
            return Err(ShopError::Config(
                "lockout max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
