use anyhow::Context;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::sources::SearchQuery;

pub const CONFIG_ENV_VAR: &str = "OCCUPANCY_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "occupancy-config.toml";

pub const DEFAULT_BASE_URL: &str = "https://datahub.bordeaux-metropole.fr/api/records/1.0/search/";
pub const DEFAULT_OUTPUT_PATH: &str = "data_bordeaux.csv";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub dataset: String,
    pub query: Option<String>,
    pub rows: u32,
    /// Facility label prefixed to every zone name.
    pub facility: String,
    /// Zone label used when the upstream record has none.
    pub default_zone: String,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            dataset: "bor_frequentation_piscine_tr".to_string(),
            query: Some("Judaïque".to_string()),
            rows: 5,
            facility: "Judaïque".to_string(),
            default_zone: "Bassin".to_string(),
        }
    }
}

impl PoolConfig {
    pub fn search_query(&self) -> SearchQuery<'_> {
        SearchQuery {
            dataset: &self.dataset,
            q: self.query.as_deref(),
            rows: self.rows,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParkingConfig {
    pub dataset: String,
    pub query: Option<String>,
    pub rows: u32,
}

impl Default for ParkingConfig {
    fn default() -> Self {
        Self {
            dataset: "st_park_p".to_string(),
            query: None,
            rows: 100,
        }
    }
}

impl ParkingConfig {
    pub fn search_query(&self) -> SearchQuery<'_> {
        SearchQuery {
            dataset: &self.dataset,
            q: self.query.as_deref(),
            rows: self.rows,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub pool: PoolConfig,
    pub parking: ParkingConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    /// Load from `$OCCUPANCY_CONFIG`, else `occupancy-config.toml` when present,
    /// else the built-in defaults.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        match env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::from_file(path),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let cfg: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(cfg)
    }
}
