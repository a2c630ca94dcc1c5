//! Error types for protected execution

use thiserror::Error;

/// Outcome of a protected call that did not produce a result
#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    /// The circuit was open and the call was rejected without running
    #[error("circuit '{circuit}' is open, call rejected")]
    Open {
        /// Name of the circuit that rejected the call
        circuit: String,
    },

    /// The protected operation ran and failed
    #[error("protected operation failed: {0}")]
    OperationFailed(E),
}

impl<E> CircuitBreakerError<E> {
    /// True when the call was rejected without running the operation.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open { .. })
    }

    /// The original operation error, when the operation actually ran.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::Open { .. } => None,
            Self::OperationFailed(error) => Some(error),
        }
    }
}

/// Rejected configuration, surfaced at construction time
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// `failure_threshold` must be at least 1
    #[error("failure_threshold must be at least 1")]
    InvalidFailureThreshold,

    /// `reset_timeout` must be non-zero
    #[error("reset_timeout must be non-zero")]
    InvalidResetTimeout,
}
