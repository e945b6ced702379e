//! Engine configuration

use crate::error::{Error, Result};

pub const DEFAULT_NAMESPACE: &str = "default";
pub const DEFAULT_DECREMENT_PATH: f64 = 1e-15;
pub const DEFAULT_CROSS_SUFFIX: &str = "_cross";
pub const DEFAULT_FANOUT_CONCURRENCY: usize = 16;

/// Read-only settings fixed when a [`GraphEngine`](super::GraphEngine) is built
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Namespace used when a request does not name one
    pub namespace: String,
    /// Distance removed per unit of weight on every reinforcing link
    pub decrement_path: f64,
    /// Appended to an entity to form the cross-link entity
    pub cross_suffix: String,
    /// Links in flight at once during fan-out
    pub fanout_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            decrement_path: DEFAULT_DECREMENT_PATH,
            cross_suffix: DEFAULT_CROSS_SUFFIX.to_string(),
            fanout_concurrency: DEFAULT_FANOUT_CONCURRENCY,
        }
    }
}

impl EngineConfig {
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_decrement_path(mut self, decrement_path: f64) -> Self {
        self.decrement_path = decrement_path;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(Error::configuration("graph.namespace must not be empty"));
        }
        if !self.decrement_path.is_finite() || self.decrement_path <= 0.0 {
            return Err(Error::configuration(format!(
                "graph.decrement_path must be a finite number greater than zero, got {}",
                self.decrement_path
            )));
        }
        if self.cross_suffix.is_empty() {
            return Err(Error::configuration("graph.cross_suffix must not be empty"));
        }
        if self.fanout_concurrency == 0 {
            return Err(Error::configuration("graph.fanout_concurrency must be at least 1"));
        }
        Ok(())
    }
}
