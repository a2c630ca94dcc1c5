//! Circuit state and configuration types

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Circuit is closed, operations proceed normally
    Closed,
    /// Circuit is open, operations are rejected without running
    Open,
    /// Circuit is half-open, a probe operation is allowed through
    HalfOpen,
}

impl CircuitState {
    /// Symbolic name of the state.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
            Self::HalfOpen => "HALF_OPEN",
        }
    }

    pub(crate) const fn tag(self) -> u8 {
        match self {
            Self::Closed => 0,
            Self::Open => 1,
            Self::HalfOpen => 2,
        }
    }

    // Total: the tag cell only ever holds values produced by `tag`.
    pub(crate) const fn from_tag(tag: u8) -> Self {
        match tag {
            1 => Self::Open,
            2 => Self::HalfOpen,
            _ => Self::Closed,
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for circuit breaker behavior
///
/// Immutable once a breaker is built. Attached instances that share one
/// block should agree on these values; the block itself carries none of
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures required to open the circuit
    pub failure_threshold: u32,
    /// Time an open circuit waits before letting a probe through
    #[serde(with = "humantime_serde")]
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_millis(10_000),
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that trips quickly and probes early
    pub fn aggressive() -> Self {
        Self {
            failure_threshold: 2,
            reset_timeout: Duration::from_secs(5),
        }
    }

    /// Create a config that tolerates longer failure streaks
    pub fn lenient() -> Self {
        Self {
            failure_threshold: 10,
            reset_timeout: Duration::from_secs(30),
        }
    }

    /// Set the failure threshold to open the circuit
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Set the cooldown before an open circuit goes half-open
    pub fn with_reset_timeout(mut self, timeout: Duration) -> Self {
        self.reset_timeout = timeout;
        self
    }

    /// Check that both knobs are usable.
    ///
    /// Called during breaker construction so a bad configuration fails
    /// there instead of on first use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::InvalidFailureThreshold);
        }
        if self.reset_timeout.is_zero() {
            return Err(ConfigError::InvalidResetTimeout);
        }
        Ok(())
    }
}

/// Point-in-time view of a shared circuit block
///
/// Each field is loaded from its cell independently; under concurrent
/// writers the snapshot is not a cross-field-consistent cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitSnapshot {
    /// State at the moment the tag cell was read
    pub state: CircuitState,
    /// Consecutive failures since the last recorded success
    pub failure_count: u32,
    /// Time of the most recent recorded failure, if any
    pub last_failure: Option<Instant>,
}
