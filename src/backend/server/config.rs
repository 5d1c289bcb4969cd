/**
 * Server Configuration
 *
 * Loads `AppConfig` from the environment and opens the optional SQLite
 * database.
 *
 * # Configuration Sources
 *
 * | Variable             | Default                    |
 * |----------------------|----------------------------|
 * | `SERVER_PORT`        | 3000                       |
 * | `DATABASE_URL`       | unset (in-memory store)    |
 * | `JWT_SECRET`         | development secret         |
 * | `MAX_MESSAGE_LENGTH` | 4000                       |
 * | `MIN_PAGE_SIZE`      | 10                         |
 * | `OUTBOUND_BUFFER`    | 256                        |
 *
 * # Error Handling
 *
 * Malformed values are a hard `ConfigError`. A database that cannot be
 * opened is logged and the server continues on the in-memory store.
 */

use std::str::FromStr;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::backend::messaging::db::{connect_options, run_migrations};
use crate::shared::config::{AppConfig, ConfigError, DEV_JWT_SECRET};

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().parse() {
            Ok(value) => Ok(Some(value)),
            Err(_) => Err(ConfigError::InvalidValue { key, value: raw }),
        },
    }
}

/// Build a config from an arbitrary variable source
pub fn config_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let mut builder = AppConfig::builder();

    if let Some(port) = parse_var(&lookup, "SERVER_PORT")? {
        builder = builder.port(port);
    }
    if let Some(url) = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
        builder = builder.database_url(url);
    }
    match lookup("JWT_SECRET") {
        Some(secret) => builder = builder.jwt_secret(secret),
        None => tracing::warn!("JWT_SECRET not set, using the development secret"),
    }
    if let Some(len) = parse_var(&lookup, "MAX_MESSAGE_LENGTH")? {
        builder = builder.max_message_length(len);
    }
    if let Some(size) = parse_var(&lookup, "MIN_PAGE_SIZE")? {
        builder = builder.min_page_size(size);
    }
    if let Some(capacity) = parse_var(&lookup, "OUTBOUND_BUFFER")? {
        builder = builder.outbound_buffer(capacity);
    }

    builder.build()
}

/// Load configuration from process environment variables
pub fn load_config() -> Result<AppConfig, ConfigError> {
    config_from_lookup(|key| std::env::var(key).ok())
}

/// Whether `config` still carries the built-in development secret
pub fn uses_dev_secret(config: &AppConfig) -> bool {
    config.jwt_secret == DEV_JWT_SECRET
}

/// Open the configured database and apply migrations
///
/// Returns `None` if no database is configured or it cannot be opened; the
/// caller falls back to the in-memory store.
pub async fn load_database(config: &AppConfig) -> Option<SqlitePool> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set. Messages will be kept in memory only.");
        return None;
    };

    tracing::info!("Connecting to database...");

    let options = match connect_options(database_url) {
        Ok(options) => options,
        Err(e) => {
            tracing::error!("Invalid DATABASE_URL: {:?}", e);
            return None;
        }
    };

    let pool = match SqlitePoolOptions::new().connect_with(options).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Falling back to the in-memory store.");
            return None;
        }
    };

    tracing::info!("Running database migrations...");
    if let Err(e) = run_migrations(&pool).await {
        tracing::error!("Failed to run database migrations: {}", e);
        tracing::warn!("Falling back to the in-memory store.");
        return None;
    }

    tracing::info!("Database ready");
    Some(pool)
}
