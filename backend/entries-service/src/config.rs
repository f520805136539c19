/// Configuration management for Entries Service
///
/// Loaded from environment variables (an optional `.env` file is read first
/// by the binaries).
use s3_utils::S3Config;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Blob storage configuration
    pub s3: S3Config,
    /// Event delivery configuration
    pub events: EventsConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// Deadline applied to every post operation
    pub request_timeout_secs: u64,
    /// Key required on post routes; unset or empty disables the check
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

/// Kafka event configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    /// When false, publish notifications go to a no-op notifier
    pub enabled: bool,
    /// Kafka brokers
    pub brokers: Vec<String>,
    /// Topic carrying post lifecycle events
    pub topic: String,
    /// Consumer group of the newsletter worker
    pub group_id: String,
    #[serde(default = "default_kafka_send_timeout_ms")]
    pub send_timeout_ms: u64,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

impl EventsConfig {
    pub fn brokers_csv(&self) -> String {
        self.brokers.join(",")
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ if production => return Err("DATABASE_URL must be set in production".to_string()),
            _ => "postgresql://localhost/entries".to_string(),
        };

        if production && std::env::var("S3_BUCKET").is_err() {
            return Err("S3_BUCKET must be set in production".to_string());
        }

        Ok(Config {
            app: AppConfig {
                env: app_env,
                host: std::env::var("ENTRIES_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("ENTRIES_SERVICE_PORT", 8080)?,
                request_timeout_secs: parse_env_or_default("REQUEST_TIMEOUT_SECS", 30)?,
                api_key: std::env::var("API_KEY")
                    .ok()
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty()),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            s3: S3Config::from_env()?,
            events: EventsConfig {
                enabled: parse_env_or_default("EVENTS_ENABLED", false)?,
                brokers: std::env::var("KAFKA_BROKERS")
                    .unwrap_or_else(|_| "localhost:9092".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                topic: std::env::var("KAFKA_EVENTS_TOPIC")
                    .unwrap_or_else(|_| "entries.events".to_string()),
                group_id: std::env::var("KAFKA_GROUP_ID")
                    .unwrap_or_else(|_| "newsletter-worker".to_string()),
                send_timeout_ms: parse_env_or_default(
                    "KAFKA_SEND_TIMEOUT_MS",
                    default_kafka_send_timeout_ms(),
                )?,
            },
        })
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        Err(_) => Ok(default),
    }
}

fn default_kafka_send_timeout_ms() -> u64 {
    5_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_or_default_uses_default_when_unset() {
        let value: u16 = parse_env_or_default("ENTRIES_TEST_UNSET_VARIABLE", 8080).unwrap();
        assert_eq!(value, 8080);
    }

    #[test]
    fn test_parse_env_or_default_reports_bad_values() {
        std::env::set_var("ENTRIES_TEST_BAD_PORT", "eighty");
        let err = parse_env_or_default::<u16>("ENTRIES_TEST_BAD_PORT", 8080).unwrap_err();
        std::env::remove_var("ENTRIES_TEST_BAD_PORT");
        assert!(err.contains("ENTRIES_TEST_BAD_PORT"));
    }
}
