//! Composition of circuit breaker and bulkhead around a single operation.
//!
//! The nesting order is fixed: the breaker wraps the bulkhead, which wraps
//! the operation. The breaker's fast-fail check therefore happens before any
//! bulkhead slot is consumed, and a bulkhead rejection surfaces to the
//! breaker as an ordinary failure - it counts toward the failure threshold.
//!
//! # Examples
//!
//! ```rust
//! use breakwater::reliability::{
//!     Bulkhead, BulkheadConfig, CircuitBreaker, CircuitBreakerConfig, Executor,
//! };
//!
//! # async fn example() {
//! let executor = Executor::new()
//!     .with_breaker(CircuitBreaker::new(CircuitBreakerConfig::default()))
//!     .with_bulkhead(Bulkhead::new(BulkheadConfig::default()));
//!
//! let result = executor.execute(|| async { Ok::<_, String>("guarded".to_string()) }).await;
//! assert!(result.is_ok());
//! # }
//! ```

use thiserror::Error;

use super::{
    bulkhead::{Bulkhead, BulkheadError},
    circuit_breaker::{CircuitBreaker, CircuitBreakerError},
};

/// Error returned by [`Executor::execute`].
///
/// Flattens the nested guard errors so callers see a single taxonomy:
/// two fast-fail sentinels plus the operation's own error, passed through
/// unmodified.
#[derive(Debug, Error)]
pub enum ExecuteError<E> {
    /// Rejected by the circuit breaker; the operation was not invoked.
    #[error("Circuit breaker is open")]
    CircuitOpen,

    /// Rejected by the bulkhead; the operation was not invoked. When a
    /// breaker is also installed, this rejection was counted as one breaker
    /// failure.
    #[error("Bulkhead is full")]
    BulkheadFull,

    /// The operation ran and failed.
    #[error(transparent)]
    Inner(E),
}

/// Composes zero, one, or both guards around an arbitrary fallible async
/// operation.
#[derive(Debug, Clone, Default)]
pub struct Executor {
    breaker: Option<CircuitBreaker>,
    bulkhead: Option<Bulkhead>,
}

impl Executor {
    /// Creates an executor with no guards installed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a circuit breaker.
    #[must_use]
    pub fn with_breaker(mut self, breaker: CircuitBreaker) -> Self {
        self.breaker = Some(breaker);
        self
    }

    /// Installs a bulkhead.
    #[must_use]
    pub fn with_bulkhead(mut self, bulkhead: Bulkhead) -> Self {
        self.bulkhead = Some(bulkhead);
        self
    }

    /// Returns the installed circuit breaker, if any.
    #[must_use]
    pub fn breaker(&self) -> Option<&CircuitBreaker> {
        self.breaker.as_ref()
    }

    /// Returns the installed bulkhead, if any.
    #[must_use]
    pub fn bulkhead(&self) -> Option<&Bulkhead> {
        self.bulkhead.as_ref()
    }

    /// Runs an operation through whichever guards are installed.
    ///
    /// - Both: breaker outside, bulkhead inside. A breaker rejection never
    ///   touches bulkhead occupancy; a bulkhead rejection counts as one
    ///   breaker failure.
    /// - One: that guard wraps the operation directly.
    /// - Neither: the operation runs unguarded.
    ///
    /// # Errors
    ///
    /// [`ExecuteError::CircuitOpen`] or [`ExecuteError::BulkheadFull`] when a
    /// guard rejects the call without invoking the operation;
    /// [`ExecuteError::Inner`] with the operation's error otherwise.
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, ExecuteError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match (&self.breaker, &self.bulkhead) {
            (Some(breaker), Some(bulkhead)) => {
                match breaker.call(|| bulkhead.call(operation)).await {
                    Ok(value) => Ok(value),
                    Err(CircuitBreakerError::Open) => Err(ExecuteError::CircuitOpen),
                    Err(CircuitBreakerError::Inner(BulkheadError::Full)) => {
                        Err(ExecuteError::BulkheadFull)
                    }
                    Err(CircuitBreakerError::Inner(BulkheadError::Inner(e))) => {
                        Err(ExecuteError::Inner(e))
                    }
                }
            }
            (Some(breaker), None) => breaker.call(operation).await.map_err(|e| match e {
                CircuitBreakerError::Open => ExecuteError::CircuitOpen,
                CircuitBreakerError::Inner(e) => ExecuteError::Inner(e),
            }),
            (None, Some(bulkhead)) => bulkhead.call(operation).await.map_err(|e| match e {
                BulkheadError::Full => ExecuteError::BulkheadFull,
                BulkheadError::Inner(e) => ExecuteError::Inner(e),
            }),
            (None, None) => operation().await.map_err(ExecuteError::Inner),
        }
    }
}
