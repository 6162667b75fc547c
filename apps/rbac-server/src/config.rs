//! Server configuration.
//!
//! Every setting can come from a command-line flag or the environment; flags
//! take precedence:
//!
//! ```bash
//! DATABASE_URL=sqlite://rbac.db?mode=rwc   # or a bare path: ./data/rbac.db
//! RBAC_ADDR=0.0.0.0:8000
//! RBAC_DB_MAX_CONNECTIONS=5
//! RBAC_LOG_FORMAT=text                     # or json
//! ```

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://rbac.db?mode=rwc";
pub const DEFAULT_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

/// Settings as given, before validation.
#[derive(Debug, Clone, Default)]
pub struct RawConfig {
    pub database_url: Option<String>,
    pub addr: Option<String>,
    pub max_connections: Option<String>,
    pub log_format: Option<String>,
}

impl RawConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").ok(),
            addr: env::var("RBAC_ADDR").ok(),
            max_connections: env::var("RBAC_DB_MAX_CONNECTIONS").ok(),
            log_format: env::var("RBAC_LOG_FORMAT").ok(),
        }
    }
}

/// Validated server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub addr: SocketAddr,
    pub max_connections: u32,
    pub log_format: LogFormat,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unsupported database URL: {0}. Only sqlite:// URLs or file paths are accepted")]
    UnsupportedDatabase(String),

    #[error("Invalid listen address: {0}")]
    InvalidAddr(String),

    #[error("Invalid max connections: {0}. Expected a positive integer")]
    InvalidMaxConnections(String),

    #[error("Invalid log format: {0}. Expected 'text' or 'json'")]
    InvalidLogFormat(String),
}

/// Accept `sqlite:` URLs as-is and turn a bare path into a create-if-missing
/// SQLite URL.
fn normalize_database_url(raw: Option<String>) -> Result<String, ConfigError> {
    let raw = match raw.map(|s| s.trim().to_string()) {
        Some(s) if !s.is_empty() => s,
        _ => return Ok(DEFAULT_DATABASE_URL.to_string()),
    };

    if raw.starts_with("sqlite:") {
        Ok(raw)
    } else if raw.contains("://") {
        Err(ConfigError::UnsupportedDatabase(raw))
    } else {
        Ok(format!("sqlite://{}?mode=rwc", raw))
    }
}

impl ServerConfig {
    pub fn resolve(raw: RawConfig) -> Result<Self, ConfigError> {
        let database_url = normalize_database_url(raw.database_url)?;

        let addr_str = raw.addr.unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_str
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidAddr(addr_str.clone()))?;

        let max_connections = match raw.max_connections {
            None => DEFAULT_MAX_CONNECTIONS,
            Some(s) => match s.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidMaxConnections(s)),
            },
        };

        let log_format = match raw.log_format {
            None => LogFormat::default(),
            Some(s) => s.parse()?,
        };

        Ok(Self {
            database_url,
            addr,
            max_connections,
            log_format,
        })
    }
}
