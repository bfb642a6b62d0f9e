use serde::Deserialize;
use std::env;
use std::time::Duration;
use transfer_catalog::CatalogData;
use transfer_shared::Locale;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub booking: BookingRules,
    /// Without a database bookings are kept in memory.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    /// Without redis the availability ledger is process-local.
    #[serde(default)]
    pub redis: Option<RedisConfig>,
    #[serde(default)]
    pub kafka: Option<KafkaConfig>,
    #[serde(default)]
    pub catalog: CatalogData,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingRules {
    pub persistence_timeout_ms: u64,
    pub ledger_timeout_ms: u64,
    #[serde(default)]
    pub default_locale: Locale,
}

impl BookingRules {
    pub fn persistence_timeout(&self) -> Duration {
        Duration::from_millis(self.persistence_timeout_ms)
    }

    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    #[serde(default = "default_confirmed_topic")]
    pub confirmed_topic: String,
    #[serde(default = "default_capacity_topic")]
    pub capacity_topic: String,
}

fn default_confirmed_topic() -> String {
    "booking.confirmed".into()
}

fn default_capacity_topic() -> String {
    "booking.capacity_exhausted".into()
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `TRANSFER__SERVER__PORT=9000`
            .add_source(config::Environment::with_prefix("TRANSFER").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Parse a single TOML document. Used by tests and tools that carry
    /// their own configuration.
    pub fn from_toml(toml: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}
