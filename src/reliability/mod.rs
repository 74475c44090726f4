//! Fault-tolerance primitives for guarding unreliable operations.
//!
//! Provides a circuit breaker, a bulkhead, and an executor that composes the
//! two around an arbitrary fallible async operation. The primitives are
//! outcome-agnostic: they only ever see "succeeded" or "failed", never the
//! shape of the operation or its error.

mod bulkhead;
mod circuit_breaker;
mod executor;

pub use bulkhead::{Bulkhead, BulkheadConfig, BulkheadError};
pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState,
};
pub use executor::{ExecuteError, Executor};
