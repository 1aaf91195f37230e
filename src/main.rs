use std::path::Path;
use std::sync::Arc;

use tracing::info;

use mugshop::auth::{hash_password, LockoutPolicy, TokenIssuer};
use mugshop::db::Database;
use mugshop::web::middleware::RateLimitState;
use mugshop::web::AppState;
use mugshop::{Config, MemoryAuditStore};

const DEFAULT_ADMIN_EMAIL: &str = "admin@mugshop.com";

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    // Load configuration
    let config = match Config::load_with_env(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    // Initialize logging
    if let Err(e) = mugshop::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        mugshop::logging::init_console_only(&config.logging.level);
    }

    info!("mugshop backend starting");

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Fatal error");
        std::process::exit(1);
    }
}

async fn run(config: Config) -> mugshop::Result<()> {
    let db = Database::open(Path::new(&config.database.path)).await?;

    seed_admin(&db).await?;

    let rate = Arc::new(RateLimitState::new(&config.security.rate_limit));
    rate.start_cleanup_task();

    let state = AppState {
        db: Arc::new(db),
        tokens: Arc::new(TokenIssuer::new(&config.security.jwt)),
        lockout: Arc::new(LockoutPolicy::new(&config.security.lockout)),
        password_policy: Arc::new(config.security.password.clone()),
        audit: Arc::new(MemoryAuditStore::new(&config.audit)),
        audit_enabled: config.audit.enabled,
    };

    mugshop::web::serve(&config, state, rate).await
}

/// Create the initial admin account when no admin exists yet.
///
/// The password comes from `MUGSHOP_ADMIN_PASSWORD` when set. Otherwise a
/// well-known development default is used and a warning is logged.
async fn seed_admin(db: &Database) -> mugshop::Result<()> {
    let (password, from_env) = match std::env::var("MUGSHOP_ADMIN_PASSWORD") {
        Ok(p) if !p.is_empty() => (p, true),
        _ => ("ChangeMe123!".to_string(), false),
    };

    let hash = hash_password(&password)
        .map_err(|e| mugshop::ShopError::Config(format!("admin password hashing failed: {e}")))?;

    if db.ensure_admin(DEFAULT_ADMIN_EMAIL, &hash).await? {
        if from_env {
            info!(email = DEFAULT_ADMIN_EMAIL, "Initial admin account created");
        } else {
            tracing::warn!(
                email = DEFAULT_ADMIN_EMAIL,
                "Initial admin account created with the default password; set MUGSHOP_ADMIN_PASSWORD"
            );
        }
    }

    Ok(())
}
