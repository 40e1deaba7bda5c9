use std::env;
use std::fmt;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// SQLite connection string for the jobs database
    /// Format: sqlite://PATH/TO/jobs.db
    pub database_url: String,

    /// Host the HTTP server binds to
    pub host: String,

    /// Port the HTTP server binds to
    pub port: u16,

    /// Maximum JSON payload size for all requests (in bytes)
    /// Default: 1MB (1024 * 1024)
    pub max_payload_size: usize,

    /// Directory receiving the rolling log files
    pub log_dir: String,
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// SERVER_PORT is not a valid port number
    InvalidPort(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort(value) => {
                write!(f, "SERVER_PORT must be a port number, got {:?}", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

pub const DEFAULT_DATABASE_URL: &str = "sqlite://jobs.db";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_PAYLOAD_SIZE: usize = 1024 * 1024;
const DEFAULT_LOG_DIR: &str = "logs";

impl Config {
    /// Load configuration from environment variables
    ///
    /// Optional environment variables:
    /// - DATABASE_URL: SQLite connection string (default: sqlite://jobs.db)
    /// - SERVER_HOST: bind host (default: 127.0.0.1)
    /// - SERVER_PORT: bind port (default: 8080)
    /// - MAX_PAYLOAD_SIZE: Maximum request payload size in bytes (default: 1048576 = 1MB)
    /// - LOG_DIR: log file directory (default: logs)
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let host = lookup("SERVER_HOST")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("SERVER_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw.clone()))?,
            None => DEFAULT_PORT,
        };

        // Parse MAX_PAYLOAD_SIZE with default fallback
        let max_payload_size = lookup("MAX_PAYLOAD_SIZE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_MAX_PAYLOAD_SIZE);

        let log_dir = lookup("LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string());

        Ok(Config {
            database_url,
            host,
            port,
            max_payload_size,
            log_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_payload_size, 1024 * 1024);
        assert_eq!(config.log_dir, "logs");
    }

    #[test]
    fn values_are_read_from_lookup() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite:///tmp/other.db"),
            ("SERVER_PORT", "9090"),
            ("MAX_PAYLOAD_SIZE", "2048"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "sqlite:///tmp/other.db");
        assert_eq!(config.port, 9090);
        assert_eq!(config.max_payload_size, 2048);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("SERVER_PORT", "eighty")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPort("eighty".to_string()));
    }

    #[test]
    fn unparseable_payload_size_falls_back_to_default() {
        let config = Config::from_lookup(lookup_from(&[("MAX_PAYLOAD_SIZE", "big")])).unwrap();
        assert_eq!(config.max_payload_size, 1024 * 1024);
    }
}
