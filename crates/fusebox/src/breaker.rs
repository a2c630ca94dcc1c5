//! Circuit breaker execution wrapper around a shared block

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

use crate::error::{CircuitBreakerError, ConfigError};
use crate::shared::SharedState;
use crate::types::{CircuitBreakerConfig, CircuitSnapshot, CircuitState};

/// Zero-argument async substitute invoked in place of a normal result.
type Fallback<T> = Arc<dyn Fn() -> BoxFuture<'static, T> + Send + Sync>;

/// Circuit breaker protecting one unreliable async operation kind.
///
/// The breaker itself is a cheap handle: cloning it, or attaching a second
/// breaker to the same [`SharedState`] block via
/// [`CircuitBreakerBuilder::shared`], yields instances that cooperate on
/// one logical circuit. Concurrent `execute` calls are never serialized;
/// two contexts may both observe a closed circuit and both run their
/// operation before either failure is recorded. That window is bounded
/// and accepted: the open/closed decision rides on single atomic cells,
/// not on a lock.
///
/// `T` is the result type of the protected operation, fixed per breaker so
/// the configured fallbacks can produce a substitute value of the same
/// type.
pub struct CircuitBreaker<T: 'static> {
    name: String,
    config: CircuitBreakerConfig,
    shared: Arc<SharedState>,
    open_fallback: Option<Fallback<T>>,
    failure_fallback: Option<Fallback<T>>,
}

impl<T: 'static> CircuitBreaker<T> {
    /// Create a breaker with default config and a fresh shared block.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        Self::with_config(name, CircuitBreakerConfig::default())
    }

    /// Create a breaker with a custom config and a fresh shared block.
    pub fn with_config(
        name: impl Into<String>,
        config: CircuitBreakerConfig,
    ) -> Result<Self, ConfigError> {
        Self::builder(name).config(config).build()
    }

    /// Start building a breaker, for fallbacks or block attachment.
    pub fn builder(name: impl Into<String>) -> CircuitBreakerBuilder<T> {
        CircuitBreakerBuilder::new(name)
    }

    /// Name of the protected resource.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration this breaker was built with.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Handle to the underlying shared block, for attaching more instances.
    pub fn shared(&self) -> Arc<SharedState> {
        Arc::clone(&self.shared)
    }

    /// Current state of the circuit.
    ///
    /// The reset-timeout expiry is polled here rather than driven by a
    /// timer: an open circuit whose cooldown has elapsed is moved to
    /// half-open on inspection. The compare-exchange makes that move land
    /// exactly once per open episode even with concurrent pollers.
    pub fn state(&self) -> CircuitState {
        let state = self.shared.state();
        if state != CircuitState::Open {
            return state;
        }
        let cooled_down = self
            .shared
            .millis_since_last_failure()
            .is_some_and(|elapsed| elapsed >= self.config.reset_timeout.as_millis() as u64);
        if !cooled_down {
            return CircuitState::Open;
        }
        if self
            .shared
            .try_transition(CircuitState::Open, CircuitState::HalfOpen)
        {
            tracing::info!(circuit = %self.name, "cooldown elapsed, circuit half-open");
        }
        self.shared.state()
    }

    /// Independent per-cell view of the shared block, without applying the
    /// cooldown poll.
    pub fn snapshot(&self) -> CircuitSnapshot {
        self.shared.snapshot()
    }

    /// Run `operation` under circuit protection.
    ///
    /// If the circuit is open the operation is not invoked: the configured
    /// open fallback supplies the result, or the call fails with
    /// [`CircuitBreakerError::Open`]. Otherwise the operation runs exactly
    /// once and its outcome is recorded; a failure is replaced by the
    /// failure fallback when one is configured, and propagated as
    /// [`CircuitBreakerError::OperationFailed`] when not.
    pub async fn execute<F, Fut, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if self.state() == CircuitState::Open {
            if let Some(fallback) = &self.open_fallback {
                return Ok(fallback().await);
            }
            return Err(CircuitBreakerError::Open {
                circuit: self.name.clone(),
            });
        }

        match operation().await {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(error) => {
                self.on_failure();
                match &self.failure_fallback {
                    Some(fallback) => Ok(fallback().await),
                    None => Err(CircuitBreakerError::OperationFailed(error)),
                }
            }
        }
    }

    /// Record a successful outcome.
    ///
    /// Resets the failure count; a half-open circuit closes. Called by
    /// [`execute`](Self::execute), and usable directly by callers that run
    /// the operation themselves.
    pub fn on_success(&self) {
        if self
            .shared
            .try_transition(CircuitState::HalfOpen, CircuitState::Closed)
        {
            tracing::info!(circuit = %self.name, "probe succeeded, circuit closed");
        }
        self.shared.reset_failures();
    }

    /// Record a failed outcome.
    ///
    /// Increments the failure count and stamps the failure time; reaching
    /// the threshold opens the circuit.
    pub fn on_failure(&self) {
        let failures = self.shared.record_failure();
        if failures >= self.config.failure_threshold {
            let previous = self.shared.swap_state(CircuitState::Open);
            if previous != CircuitState::Open {
                tracing::warn!(
                    circuit = %self.name,
                    failures,
                    "failure threshold reached, circuit opened"
                );
            }
        }
    }

    /// Force the circuit into half-open, bypassing the cooldown.
    ///
    /// For operator-driven recovery probes. The failure count is left
    /// untouched, so a failed probe re-opens the circuit immediately.
    pub fn transition_to_half_open(&self) {
        self.shared.set_state(CircuitState::HalfOpen);
        tracing::info!(circuit = %self.name, "circuit forced half-open");
    }
}

impl<T: 'static> Clone for CircuitBreaker<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            config: self.config.clone(),
            shared: Arc::clone(&self.shared),
            open_fallback: self.open_fallback.clone(),
            failure_fallback: self.failure_fallback.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for CircuitBreaker<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("state", &self.shared.state())
            .finish_non_exhaustive()
    }
}

/// Builder for [`CircuitBreaker`]
pub struct CircuitBreakerBuilder<T: 'static> {
    name: String,
    config: CircuitBreakerConfig,
    shared: Option<Arc<SharedState>>,
    open_fallback: Option<Fallback<T>>,
    failure_fallback: Option<Fallback<T>>,
}

impl<T: 'static> CircuitBreakerBuilder<T> {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: CircuitBreakerConfig::default(),
            shared: None,
            open_fallback: None,
            failure_fallback: None,
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: CircuitBreakerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the failure threshold to open the circuit.
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    /// Set the cooldown before an open circuit goes half-open.
    pub fn reset_timeout(mut self, timeout: Duration) -> Self {
        self.config.reset_timeout = timeout;
        self
    }

    /// Attach to an existing shared block instead of allocating a fresh
    /// one, so this instance cooperates with every other holder of the
    /// same handle.
    pub fn shared(mut self, shared: Arc<SharedState>) -> Self {
        self.shared = Some(shared);
        self
    }

    /// Substitute result produced when the circuit rejects a call.
    pub fn open_fallback<F, Fut>(mut self, fallback: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.open_fallback = Some(Arc::new(move || -> BoxFuture<'static, T> {
            Box::pin(fallback())
        }));
        self
    }

    /// Substitute result produced when the protected operation fails.
    pub fn failure_fallback<F, Fut>(mut self, fallback: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = T> + Send + 'static,
    {
        self.failure_fallback = Some(Arc::new(move || -> BoxFuture<'static, T> {
            Box::pin(fallback())
        }));
        self
    }

    /// Validate the configuration and build the breaker.
    pub fn build(self) -> Result<CircuitBreaker<T>, ConfigError> {
        self.config.validate()?;
        Ok(CircuitBreaker {
            name: self.name,
            config: self.config,
            shared: self.shared.unwrap_or_default(),
            open_fallback: self.open_fallback,
            failure_fallback: self.failure_fallback,
        })
    }
}
