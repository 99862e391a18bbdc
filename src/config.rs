//! Configuration loader and validator.
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub database: Database,
}

/// Connection pool settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Database {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
    #[serde(default)]
    pub tables: Tables,
}

/// Table names the repository reads and writes. Adverts are owned by another
/// service; only their id column is joined on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Tables {
    pub subscribers: String,
    pub subscriptions: String,
    pub adverts: String,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            subscribers: "subscribers".into(),
            subscriptions: "subscriptions".into(),
            adverts: "adverts".into(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_ms() -> u64 {
    3000
}

/// Load configuration from a YAML file and validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
/// - `DATABASE_URL`, when set, replaces `database.url`.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let content = fs::read_to_string(path)?;
    let mut cfg: Config = serde_yaml::from_str(&content)?;
    if let Ok(url) = std::env::var("DATABASE_URL") {
        cfg.database.url = url;
    }
    validate(&cfg)?;
    Ok(cfg)
}

fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.database.url.trim().is_empty() {
        return Err(ConfigError::Invalid("database.url must be non-empty"));
    }
    if cfg.database.max_connections == 0 {
        return Err(ConfigError::Invalid("database.max_connections must be > 0"));
    }
    if cfg.database.acquire_timeout_ms == 0 {
        return Err(ConfigError::Invalid("database.acquire_timeout_ms must be > 0"));
    }
    let t = &cfg.database.tables;
    if [&t.subscribers, &t.subscriptions, &t.adverts]
        .iter()
        .any(|name| name.trim().is_empty())
    {
        return Err(ConfigError::Invalid("database.tables entries must be non-empty"));
    }
    Ok(())
}

/// Example configuration file.
pub fn example() -> &'static str {
    r#"database:
  url: "sqlite://./data/subscribers.db"
  max_connections: 5
  acquire_timeout_ms: 3000
  tables:
    subscribers: "subscribers"
    subscriptions: "subscriptions"
    adverts: "adverts"
"#
}
