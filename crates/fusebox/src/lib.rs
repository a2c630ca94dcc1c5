//! Lock-free circuit breaker around a shared block of atomic cells.
//!
//! A [`CircuitBreaker`] wraps an unreliable async operation and stops
//! calling it once consecutive failures cross a threshold. The observable
//! state lives in a [`SharedState`] block of three atomic cells, so any
//! number of breaker instances across tasks or threads can attach to the
//! same logical circuit and cooperate without a lock.
//!
//! After `failure_threshold` consecutive failures the circuit opens and
//! calls are rejected outright (or served by a configured fallback). Once
//! `reset_timeout` has elapsed the next call or inspection moves the
//! circuit to half-open; a single successful probe closes it again.
//!
//! ```
//! use fusebox::CircuitBreaker;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let breaker: CircuitBreaker<String> = CircuitBreaker::new("payments").unwrap();
//!
//! let result = breaker
//!     .execute(|| async { Ok::<_, std::io::Error>("charged".to_string()) })
//!     .await;
//! assert_eq!(result.unwrap(), "charged");
//! # }
//! ```

pub mod breaker;
pub mod error;
pub mod registry;
pub mod shared;
pub mod types;

pub use breaker::{CircuitBreaker, CircuitBreakerBuilder};
pub use error::{CircuitBreakerError, ConfigError};
pub use registry::CircuitRegistry;
pub use shared::SharedState;
pub use types::{CircuitBreakerConfig, CircuitSnapshot, CircuitState};
