use dispatch_quote::{RateCard, ScoreWeights};
use dispatch_routing::RoutingConfig;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub pricing: RateCard,
    pub scoring: ScoreWeights,
    pub routing: RoutingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            pricing: RateCard::default(),
            scoring: ScoreWeights::default(),
            routing: RoutingConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    /// sqlx connection string for the embedded store
    pub url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://dispatch.sqlite3?mode=rwc".to_string(),
        }
    }
}

impl Config {
    /// Layered load: `config/default`, then the `RUN_MODE` overlay, then an
    /// uncommitted `config/local`, then `DISPATCH__`-prefixed environment
    /// variables. A missing store url is the one fatal startup error.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("DISPATCH").separator("__"))
            .build()?;

        let cfg: Config = s.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.store.url.trim().is_empty() {
            return Err(config::ConfigError::Message("store.url must not be empty".to_string()));
        }
        Ok(())
    }
}
