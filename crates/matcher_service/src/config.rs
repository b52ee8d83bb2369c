//! Composition-root configuration: every tunable in one place, loaded via
//! `config` layered over `matcher.toml` + `MATCHER_`-prefixed environment
//! variables, with `dotenvy` pulling in a local `.env` first.

use matcher_core::config::EngineConfig;
use serde::Deserialize;

fn default_log_level() -> String {
    "info".to_string()
}

fn default_worker_pool_size() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    64
}

fn default_startup_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_pool_key() -> String {
    "h3:airport_pool".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutingConfig {
    pub api_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PoolStoreSettings {
    pub url: String,
    #[serde(default = "default_pool_key")]
    pub pool_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusSettings {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatcherSettings {
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            worker_pool_size: default_worker_pool_size(),
            queue_capacity: default_queue_capacity(),
            startup_timeout_secs: default_startup_timeout_secs(),
        }
    }
}

/// Everything a running matcher needs: the pure engine tunables plus every
/// adapter's connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MatcherConfig {
    #[serde(flatten)]
    pub engine: EngineConfig,
    pub routing: RoutingConfig,
    pub pool: PoolStoreSettings,
    pub database: DatabaseSettings,
    pub bus: BusSettings,
    #[serde(default)]
    pub dispatcher: DispatcherSettings,
    #[serde(default = "default_logging")]
    pub logging: LoggingConfig,
}

fn default_logging() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
    }
}

impl MatcherConfig {
    /// Loads `config/matcher.toml` (if present), then `config/local.toml`
    /// (optional, for untracked local overrides), then environment
    /// variables prefixed `MATCHER__`, mirroring the layering the pack's
    /// other service crates use.
    pub fn load() -> Result<Self, config::ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name("config/matcher").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("MATCHER").separator("__"))
            .build()?;
        cfg.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> config::Config {
        config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                origin_lat = 40.0
                origin_lng = -73.0

                [routing]
                api_url = "http://localhost:8081/directions"

                [pool]
                url = "redis://127.0.0.1:6379"

                [database]
                url = "postgres://localhost/matcher_test"

                [bus]
                url = "redis://127.0.0.1:6379"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
    }

    #[test]
    fn unspecified_fields_fall_back_to_documented_defaults() {
        let cfg: MatcherConfig = minimal_config().try_deserialize().unwrap();
        assert_eq!(cfg.engine.max_passengers, 3);
        assert_eq!(cfg.engine.luggage_capacity, 4);
        assert_eq!(cfg.dispatcher.worker_pool_size, 4);
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.routing.request_timeout_secs, 5);
    }
}
