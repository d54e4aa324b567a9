//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Realtime and notification fan-out configuration.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Health reporting configuration.
    #[serde(default)]
    pub health: HealthConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance, used to build recipe links.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Realtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    /// Capacity of the in-process fan-out queue.
    #[serde(default = "default_fanout_buffer")]
    pub fanout_buffer: usize,
    /// Maximum notification writes in flight for a single activity.
    #[serde(default = "default_fanout_concurrency")]
    pub fanout_concurrency: usize,
    /// Push the caller's full notification list to their room whenever
    /// `GET /notifications` is served.
    #[serde(default = "default_true")]
    pub broadcast_on_list: bool,
}

/// Health reporting configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    /// Number of recent errors retained for the health endpoint.
    #[serde(default = "default_error_log_capacity")]
    pub error_log_capacity: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            fanout_buffer: default_fanout_buffer(),
            fanout_concurrency: default_fanout_concurrency(),
            broadcast_on_list: true,
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            error_log_capacity: default_error_log_capacity(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_fanout_buffer() -> usize {
    1024
}

const fn default_fanout_concurrency() -> usize {
    8
}

const fn default_error_log_capacity() -> usize {
    50
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `RECIPEBOX_ENV`)
    /// 3. Environment variables with `RECIPEBOX__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("RECIPEBOX_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("RECIPEBOX")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("RECIPEBOX")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Result<Config, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config = parse(
            r#"
            [server]
            url = "https://recipes.example.com"

            [database]
            url = "postgres://localhost/recipebox"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.max_connections, 100);
        assert_eq!(config.realtime.fanout_buffer, 1024);
        assert_eq!(config.realtime.fanout_concurrency, 8);
        assert!(config.realtime.broadcast_on_list);
        assert_eq!(config.health.error_log_capacity, 50);
    }

    #[test]
    fn test_realtime_overrides() {
        let config = parse(
            r#"
            [server]
            url = "https://recipes.example.com"
            port = 8080

            [database]
            url = "postgres://localhost/recipebox"

            [realtime]
            broadcast_on_list = false
            fanout_concurrency = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(!config.realtime.broadcast_on_list);
        assert_eq!(config.realtime.fanout_concurrency, 2);
        assert_eq!(config.realtime.fanout_buffer, 1024);
    }

    #[test]
    fn test_missing_database_url_is_an_error() {
        let result = parse(
            r#"
            [server]
            url = "https://recipes.example.com"

            [database]
            max_connections = 4
            "#,
        );

        assert!(result.is_err());
    }
}
