//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::domain::graph::{
    DEFAULT_CROSS_SUFFIX, DEFAULT_DECREMENT_PATH, DEFAULT_FANOUT_CONCURRENCY, DEFAULT_NAMESPACE,
    EngineConfig,
};
use crate::domain::ingest::DEFAULT_CHANNEL_CAPACITY;
use crate::domain::traversal::{DEFAULT_MAX_PATH, DEFAULT_MIN_PATH, TraversalOptions};
use crate::error::Error;
use crate::storage::{DEFAULT_MAX_CONNECTIONS, DatabaseConfig, default_database_path};

/// Affinity configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub graph: GraphConfig,
    pub backend: BackendConfig,
    pub traversal: TraversalConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphConfig {
    pub namespace: String,
    pub decrement_path: f64,
    pub cross_suffix: String,
    pub fanout_concurrency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// `sqlite` or `memory`
    pub kind: String,
    pub path: Option<PathBuf>,
    pub max_connections: u32,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraversalConfig {
    pub min_path: usize,
    pub max_path: usize,
    pub concurrency: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    pub channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            graph: GraphConfig {
                namespace: DEFAULT_NAMESPACE.to_string(),
                decrement_path: DEFAULT_DECREMENT_PATH,
                cross_suffix: DEFAULT_CROSS_SUFFIX.to_string(),
                fanout_concurrency: DEFAULT_FANOUT_CONCURRENCY,
            },
            backend: BackendConfig {
                kind: BackendKind::Sqlite.as_str().to_string(),
                path: None,
                max_connections: DEFAULT_MAX_CONNECTIONS,
                timeout_ms: 5000,
            },
            traversal: TraversalConfig {
                min_path: DEFAULT_MIN_PATH,
                max_path: DEFAULT_MAX_PATH,
                concurrency: None,
            },
            ingest: IngestConfig {
                channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            },
        }
    }
}

/// Storage family selected by `backend.kind`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Table store in a SQLite file
    Sqlite,
    /// Range store held in process memory
    Memory,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        }
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(Error::configuration(format!(
                "Unknown backend kind: {}. Valid options: sqlite, memory",
                other
            ))),
        }
    }
}

const KEYS: [&str; 12] = [
    "graph.namespace",
    "graph.decrement_path",
    "graph.cross_suffix",
    "graph.fanout_concurrency",
    "backend.kind",
    "backend.path",
    "backend.max_connections",
    "backend.timeout_ms",
    "traversal.min_path",
    "traversal.max_path",
    "traversal.concurrency",
    "ingest.channel_capacity",
];

fn parse_number<T: FromStr>(key: &str, value: &str) -> anyhow::Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow!("Invalid {} value: {}", key, value))
}

fn positive(key: &str, value: usize) -> anyhow::Result<usize> {
    if value == 0 {
        return Err(anyhow!("{} must be at least 1", key));
    }
    Ok(value)
}

/// `none` and the empty string clear an optional setting
fn is_unset(value: &str) -> bool {
    matches!(value.trim(), "" | "none")
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("AFFINITY_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("affinity")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location, or defaults if absent
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file, or defaults if absent
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        self.engine_config().validate()?;
        self.backend_kind()?;
        if self.backend.max_connections == 0 {
            return Err(anyhow!("backend.max_connections must be at least 1"));
        }
        if self.backend.timeout_ms == 0 {
            return Err(anyhow!("backend.timeout_ms must be at least 1"));
        }
        if self.traversal.min_path > self.traversal.max_path {
            return Err(anyhow!(
                "traversal.min_path ({}) must not exceed traversal.max_path ({})",
                self.traversal.min_path,
                self.traversal.max_path
            ));
        }
        if self.traversal.concurrency == Some(0) {
            return Err(anyhow!("traversal.concurrency must be at least 1"));
        }
        if self.ingest.channel_capacity == 0 {
            return Err(anyhow!("ingest.channel_capacity must be at least 1"));
        }
        Ok(())
    }

    pub fn backend_kind(&self) -> Result<BackendKind, Error> {
        self.backend.kind.parse()
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            namespace: self.graph.namespace.clone(),
            decrement_path: self.graph.decrement_path,
            cross_suffix: self.graph.cross_suffix.clone(),
            fanout_concurrency: self.graph.fanout_concurrency,
        }
    }

    /// Traversal defaults; callers layer per-request settings on top
    pub fn traversal_options(&self) -> TraversalOptions {
        TraversalOptions {
            concurrency: self.traversal.concurrency,
            min_path: self.traversal.min_path,
            max_path: self.traversal.max_path,
            ..Default::default()
        }
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend.timeout_ms)
    }

    /// Database settings; without `backend.path` the file sits next to the config
    pub fn database_config(&self) -> DatabaseConfig {
        let path = match &self.backend.path {
            Some(path) => path.clone(),
            None => Self::config_dir()
                .map(|dir| dir.join("affinity.db"))
                .unwrap_or_else(|_| default_database_path()),
        };
        DatabaseConfig::with_path(path).max_connections(self.backend.max_connections)
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        let value = match key {
            "graph.namespace" => self.graph.namespace.clone(),
            "graph.decrement_path" => self.graph.decrement_path.to_string(),
            "graph.cross_suffix" => self.graph.cross_suffix.clone(),
            "graph.fanout_concurrency" => self.graph.fanout_concurrency.to_string(),

            "backend.kind" => self.backend.kind.clone(),
            "backend.path" => match &self.backend.path {
                Some(path) => path.display().to_string(),
                None => format!("(default: {})", self.database_config().path.display()),
            },
            "backend.max_connections" => self.backend.max_connections.to_string(),
            "backend.timeout_ms" => self.backend.timeout_ms.to_string(),

            "traversal.min_path" => self.traversal.min_path.to_string(),
            "traversal.max_path" => self.traversal.max_path.to_string(),
            "traversal.concurrency" => self
                .traversal
                .concurrency
                .map_or_else(|| "(unbounded)".to_string(), |c| c.to_string()),

            "ingest.channel_capacity" => self.ingest.channel_capacity.to_string(),

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `affinity config list` to see available keys.",
                    key
                ));
            }
        };
        Ok(value)
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "graph.namespace" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("graph.namespace must not be empty"));
                }
                self.graph.namespace = value.trim().to_string();
            }
            "graph.decrement_path" => {
                let step: f64 = parse_number(key, value)?;
                if !step.is_finite() || step <= 0.0 {
                    return Err(anyhow!("graph.decrement_path must be a finite number greater than zero"));
                }
                self.graph.decrement_path = step;
            }
            "graph.cross_suffix" => {
                if value.is_empty() {
                    return Err(anyhow!("graph.cross_suffix must not be empty"));
                }
                self.graph.cross_suffix = value.to_string();
            }
            "graph.fanout_concurrency" => {
                self.graph.fanout_concurrency = positive(key, parse_number(key, value)?)?;
            }

            "backend.kind" => {
                let kind: BackendKind = value.parse()?;
                self.backend.kind = kind.as_str().to_string();
            }
            "backend.path" => {
                self.backend.path = (!is_unset(value)).then(|| PathBuf::from(value.trim()));
            }
            "backend.max_connections" => {
                let max: u32 = parse_number(key, value)?;
                if max == 0 {
                    return Err(anyhow!("backend.max_connections must be at least 1"));
                }
                self.backend.max_connections = max;
            }
            "backend.timeout_ms" => {
                let millis: u64 = parse_number(key, value)?;
                if millis == 0 {
                    return Err(anyhow!("backend.timeout_ms must be at least 1"));
                }
                self.backend.timeout_ms = millis;
            }

            "traversal.min_path" => {
                let min: usize = parse_number(key, value)?;
                if min > self.traversal.max_path {
                    return Err(anyhow!("traversal.min_path must not exceed traversal.max_path"));
                }
                self.traversal.min_path = min;
            }
            "traversal.max_path" => {
                let max: usize = parse_number(key, value)?;
                if max < self.traversal.min_path {
                    return Err(anyhow!("traversal.max_path must not be below traversal.min_path"));
                }
                self.traversal.max_path = max;
            }
            "traversal.concurrency" => {
                self.traversal.concurrency = if is_unset(value) {
                    None
                } else {
                    Some(positive(key, parse_number(key, value)?)?)
                };
            }

            "ingest.channel_capacity" => {
                self.ingest.channel_capacity = positive(key, parse_number(key, value)?)?;
            }

            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `affinity config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        KEYS.into_iter()
            .map(|key| Ok((key.to_string(), self.get(key)?)))
            .collect()
    }

    /// Reset configuration to defaults by removing the config file
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
