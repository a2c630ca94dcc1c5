//! Registry of shared circuit blocks keyed by resource name

use std::sync::Arc;

use crate::breaker::CircuitBreaker;
use crate::error::ConfigError;
use crate::shared::SharedState;
use crate::types::{CircuitBreakerConfig, CircuitState};

/// Collection of shared blocks for multiple protected resources.
///
/// The registry owns one [`SharedState`] block per resource name and hands
/// out handles on demand, so independently constructed breakers (one per
/// worker task, say) attach to the same logical circuit without any
/// global state.
pub struct CircuitRegistry {
    circuits: dashmap::DashMap<String, Arc<SharedState>>,
    default_config: CircuitBreakerConfig,
}

impl CircuitRegistry {
    /// Create a registry with the default breaker config.
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    /// Create a registry with a custom default breaker config.
    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: dashmap::DashMap::new(),
            default_config: config,
        }
    }

    /// Shared block for a resource, created on first use.
    pub fn shared(&self, name: &str) -> Arc<SharedState> {
        self.circuits
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(SharedState::new()))
            .clone()
    }

    /// Breaker attached to the named resource's block, using the
    /// registry's default config.
    pub fn breaker<T: 'static>(&self, name: &str) -> Result<CircuitBreaker<T>, ConfigError> {
        CircuitBreaker::builder(name)
            .config(self.default_config.clone())
            .shared(self.shared(name))
            .build()
    }

    /// All registered resource names.
    pub fn names(&self) -> Vec<String> {
        self.circuits.iter().map(|e| e.key().clone()).collect()
    }

    /// Raw state of every registered circuit.
    pub fn states(&self) -> Vec<(String, CircuitState)> {
        self.circuits
            .iter()
            .map(|e| (e.key().clone(), e.value().state()))
            .collect()
    }
}

impl Default for CircuitRegistry {
    fn default() -> Self {
        Self::new()
    }
}
