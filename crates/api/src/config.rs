//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use saga::SagaConfig;

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST` — bind address (default: `"0.0.0.0"`)
/// - `PORT` — listen port (default: `8080`)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
/// - `STOCK_CHECK_TIMEOUT_MS` — stock check budget (default: `10000`)
/// - `HEALTH_CHECK_WINDOW_MS` — how long `/health` waits for workers (default: `2000`)
/// - `NOTIFY_ON_REJECTION` — notify users of stock rejections (default: `true`)
/// - `DATABASE_URL` — Postgres stock ledger; unset means in-memory
/// - `DATABASE_CONNECT_ATTEMPTS` — connection attempts, 2 s apart (default: `5`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub stock_check_timeout: Duration,
    pub health_check_window: Duration,
    pub notify_on_rejection: bool,
    pub database_url: Option<String>,
    pub database_connect_attempts: u32,
}

/// Delay between database connection attempts.
pub const DATABASE_RETRY_DELAY: Duration = Duration::from_secs(2);

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: parsed_var("PORT").unwrap_or(defaults.port),
            log_level: std::env::var("RUST_LOG").unwrap_or(defaults.log_level),
            stock_check_timeout: parsed_var("STOCK_CHECK_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.stock_check_timeout),
            health_check_window: parsed_var("HEALTH_CHECK_WINDOW_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.health_check_window),
            notify_on_rejection: std::env::var("NOTIFY_ON_REJECTION")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.notify_on_rejection),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.is_empty()),
            database_connect_attempts: parsed_var("DATABASE_CONNECT_ATTEMPTS")
                .unwrap_or(defaults.database_connect_attempts),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The saga settings carried by this configuration.
    pub fn saga_config(&self) -> SagaConfig {
        SagaConfig {
            stock_check_timeout: self.stock_check_timeout,
            notify_on_rejection: self.notify_on_rejection,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            stock_check_timeout: Duration::from_secs(10),
            health_check_window: Duration::from_secs(2),
            notify_on_rejection: true,
            database_url: None,
            database_connect_attempts: 5,
        }
    }
}

fn parsed_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
