use lotkeeper_core::RateConfig;
use lotkeeper_shared::{Role, VehicleType};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub rates: RateConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default = "default_event_capacity")]
    pub event_buffer: usize,
}

fn default_event_capacity() -> usize {
    100
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// JSON snapshot location. Unset means state lives in memory only.
    pub snapshot_path: Option<String>,
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval_seconds: u64,
}

fn default_snapshot_interval() -> u64 {
    30
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            snapshot_interval_seconds: default_snapshot_interval(),
        }
    }
}

/// Records created at startup when missing
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SeedConfig {
    #[serde(default)]
    pub spots: Vec<SeedSpot>,
    #[serde(default)]
    pub users: Vec<SeedUser>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedSpot {
    pub section: String,
    pub number: u32,
    #[serde(rename = "type")]
    pub spot_type: VehicleType,
    pub label: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // LOTKEEPER__SERVER__PORT=8080 sets server.port
            .add_source(config::Environment::with_prefix("LOTKEEPER").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    /// Parse a single TOML document, without files or environment
    pub fn from_toml(source: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_toml("[server]\nport = 8080\n").unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.event_buffer, 100);
        assert!(config.storage.snapshot_path.is_none());
        assert_eq!(config.rates.grace_minutes, 10);
        assert!(config.seed.spots.is_empty());
    }

    #[test]
    fn test_seed_and_rates_parse() {
        let config = Config::from_toml(
            r#"
            [server]
            port = 3000

            [rates]
            grace_minutes = 5

            [[seed.spots]]
            section = "A"
            number = 1
            type = "CAR"

            [[seed.users]]
            first_name = "Ana"
            last_name = "Ruiz"
            email = "ana@lot.test"
            role = "ADMIN"
            "#,
        )
        .unwrap();

        assert_eq!(config.rates.grace_minutes, 5);
        assert_eq!(config.seed.spots[0].spot_type, VehicleType::Car);
        assert_eq!(config.seed.users[0].role, Role::Admin);
    }

    #[test]
    fn test_unknown_enum_value_fails() {
        let result = Config::from_toml(
            r#"
            [server]
            port = 3000

            [[seed.spots]]
            section = "A"
            number = 1
            type = "HOVERCRAFT"
            "#,
        );

        assert!(result.is_err());
    }
}
