//! Application configuration module
//!
//! Provides the runtime configuration for the messaging server. Values are
//! normally read from the environment by `backend::server::config`, but the
//! builder is also used directly by tests.

use thiserror::Error;

/// Default upper bound on message content, in characters
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 4000;

/// Smallest page size a conversation page is served with
pub const DEFAULT_MIN_PAGE_SIZE: u32 = 10;

/// Per-connection outbound queue capacity
pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;

/// Development-only signing secret, used when `JWT_SECRET` is unset
pub const DEV_JWT_SECRET: &str = "dmrelay-dev-secret-change-in-production";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Port the HTTP server listens on
    pub port: u16,
    /// SQLite connection string; `None` runs with in-memory storage
    pub database_url: Option<String>,
    /// HMAC secret used to verify bearer tokens
    pub jwt_secret: String,
    /// Maximum message content length in characters
    pub max_message_length: usize,
    /// Page sizes below this are raised to it
    pub min_page_size: u32,
    /// Capacity of each connection's outbound event queue
    pub outbound_buffer: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            database_url: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
            min_page_size: DEFAULT_MIN_PAGE_SIZE,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }
}

impl AppConfig {
    /// Create a new AppConfigBuilder
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingValue("JWT_SECRET"));
        }
        if self.max_message_length == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MAX_MESSAGE_LENGTH",
                value: "0".to_string(),
            });
        }
        if self.min_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MIN_PAGE_SIZE",
                value: "0".to_string(),
            });
        }
        if self.outbound_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                key: "OUTBOUND_BUFFER",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for AppConfig
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    port: Option<u16>,
    database_url: Option<String>,
    jwt_secret: Option<String>,
    max_message_length: Option<usize>,
    min_page_size: Option<u32>,
    outbound_buffer: Option<usize>,
}

impl AppConfigBuilder {
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = Some(secret.into());
        self
    }

    pub fn max_message_length(mut self, len: usize) -> Self {
        self.max_message_length = Some(len);
        self
    }

    pub fn min_page_size(mut self, size: u32) -> Self {
        self.min_page_size = Some(size);
        self
    }

    pub fn outbound_buffer(mut self, capacity: usize) -> Self {
        self.outbound_buffer = Some(capacity);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<AppConfig, ConfigError> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            port: self.port.unwrap_or(defaults.port),
            database_url: self.database_url,
            jwt_secret: self.jwt_secret.unwrap_or(defaults.jwt_secret),
            max_message_length: self.max_message_length.unwrap_or(defaults.max_message_length),
            min_page_size: self.min_page_size.unwrap_or(defaults.min_page_size),
            outbound_buffer: self.outbound_buffer.unwrap_or(defaults.outbound_buffer),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("missing value: {0}")]
    MissingValue(&'static str),
}
