use crate::models::RatingScale;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub postgres: PostgresConfig,
    pub recommendation: RecommendationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// JSON seed file for the in-memory backend.
    pub seed_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
}

/// How neighbours with negative similarity are treated by the predictors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingMode {
    #[default]
    PositiveOnly,
    Signed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    UserBased,
    ItemBased,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub rating_min: u8,
    pub rating_max: u8,
    pub weighting: WeightingMode,
    pub strategy: Strategy,
    pub min_support: usize,
    pub default_count: usize,
    pub max_count: usize,
    /// Zero disables the periodic refresh task.
    pub refresh_interval_secs: u64,
}

impl RecommendationConfig {
    pub fn scale(&self) -> RatingScale {
        RatingScale::new(self.rating_min, self.rating_max)
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            rating_min: 1,
            rating_max: 5,
            weighting: WeightingMode::PositiveOnly,
            strategy: Strategy::UserBased,
            min_support: 1,
            default_count: 10,
            max_count: 100,
            refresh_interval_secs: 300,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8006,
            workers: num_cpus::get(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            seed_path: None,
        }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgresql://localhost:5432/filmrec".to_string(),
            max_connections: 10,
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        Self::load(path, Self::environment())
    }

    /// `FILMREC__SECTION__KEY` overrides, e.g. `FILMREC__SERVER__PORT`.
    pub fn environment() -> config::Environment {
        config::Environment::with_prefix("FILMREC")
            .separator("__")
            .try_parsing(true)
    }

    /// Layers `env` over the file at `path`, then validates the result.
    pub fn load(path: &str, env: config::Environment) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(env)
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let rec = &self.recommendation;
        if rec.rating_min >= rec.rating_max {
            anyhow::bail!(
                "rating scale is empty: min {} must be below max {}",
                rec.rating_min,
                rec.rating_max
            );
        }
        if rec.min_support == 0 {
            anyhow::bail!("min_support must be at least 1");
        }
        if rec.default_count > rec.max_count {
            anyhow::bail!(
                "default_count {} exceeds max_count {}",
                rec.default_count,
                rec.max_count
            );
        }
        if self.store.backend == StoreBackend::Postgres && self.postgres.url.is_empty() {
            anyhow::bail!("postgres backend selected without a connection url");
        }
        Ok(())
    }
}
