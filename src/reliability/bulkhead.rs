//! Bulkhead pattern for bounding concurrent executions.
//!
//! A bulkhead caps how many guarded operations may run at once, preventing a
//! slow downstream from soaking up every task in the process. Admission is
//! strictly non-blocking: a call either claims a slot instantly or is
//! rejected instantly. There is no queue.
//!
//! # Examples
//!
//! ```rust
//! use breakwater::reliability::{Bulkhead, BulkheadConfig};
//!
//! # async fn example() {
//! let bulkhead = Bulkhead::new(BulkheadConfig { capacity: 4 });
//!
//! let result = bulkhead.call(|| async { Ok::<_, String>("done".to_string()) }).await;
//! assert!(result.is_ok());
//! assert_eq!(bulkhead.available(), 4);
//! # }
//! ```

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Semaphore;

use crate::error::{ClientError, Result};

/// Configuration for a bulkhead.
#[derive(Debug, Clone, Deserialize)]
pub struct BulkheadConfig {
    /// Maximum number of concurrently admitted operations.
    ///
    /// Must be at least 1. Default: 1.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for BulkheadConfig {
    fn default() -> Self {
        Self { capacity: default_capacity() }
    }
}

impl BulkheadConfig {
    /// Validates configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] if `capacity` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(ClientError::InvalidConfig(
                "bulkhead.capacity must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

fn default_capacity() -> usize {
    1
}

/// Bounded concurrent-execution admission gate.
///
/// Cheap to clone: clones share the same slot pool. Slot accounting is a
/// semaphore; every successful acquisition is paired with exactly one release
/// because the permit is dropped when the operation returns, however it
/// terminates.
#[derive(Debug, Clone)]
pub struct Bulkhead {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl Bulkhead {
    /// Creates a new bulkhead with all slots free.
    #[must_use]
    pub fn new(config: BulkheadConfig) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(config.capacity)), capacity: config.capacity }
    }

    /// Returns the configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of currently free slots.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Executes an operation if a slot is free.
    ///
    /// Claims a slot atomically without blocking, runs the operation, and
    /// releases the slot unconditionally when it returns. If no slot is
    /// free the operation is never invoked.
    ///
    /// # Errors
    ///
    /// Returns [`BulkheadError::Full`] when every slot is occupied, or
    /// [`BulkheadError::Inner`] carrying the operation's own error unmodified.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> std::result::Result<T, BulkheadError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let Ok(permit) = self.semaphore.try_acquire() else {
            tracing::debug!(capacity = self.capacity, "Bulkhead full, rejecting call");
            return Err(BulkheadError::Full);
        };

        let result = operation().await;
        drop(permit);
        result.map_err(BulkheadError::Inner)
    }
}

/// Error returned by [`Bulkhead::call`].
#[derive(Debug, Error)]
pub enum BulkheadError<E> {
    /// Every slot is occupied; the operation was not invoked.
    #[error("Bulkhead is full")]
    Full,

    /// The operation ran and failed; the inner error is passed through
    /// unmodified.
    #[error(transparent)]
    Inner(E),
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::sync::Notify;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = BulkheadConfig::default();
        assert_eq!(config.capacity, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_rejects_zero_capacity() {
        let config = BulkheadConfig { capacity: 0 };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_toml() {
        let config: BulkheadConfig = toml::from_str("capacity = 8").unwrap();
        assert_eq!(config.capacity, 8);

        let config: BulkheadConfig = toml::from_str("").unwrap();
        assert_eq!(config.capacity, 1); // default
    }

    #[tokio::test]
    async fn test_result_passes_through() {
        let bulkhead = Bulkhead::new(BulkheadConfig::default());

        let ok = bulkhead.call(|| async { Ok::<_, String>(42) }).await;
        assert_eq!(ok.unwrap(), 42);

        let err = bulkhead.call(|| async { Err::<i32, _>("boom".to_string()) }).await;
        match err {
            Err(BulkheadError::Inner(e)) => assert_eq!(e, "boom"),
            _ => panic!("expected Inner error"),
        }
    }

    #[tokio::test]
    async fn test_slot_released_after_failure() {
        let bulkhead = Bulkhead::new(BulkheadConfig { capacity: 2 });

        let _ = bulkhead.call(|| async { Err::<(), _>("boom".to_string()) }).await;

        assert_eq!(bulkhead.available(), 2);
    }

    #[tokio::test]
    async fn test_second_concurrent_call_rejected() {
        let bulkhead = Bulkhead::new(BulkheadConfig { capacity: 1 });

        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());

        let first = tokio::spawn({
            let bulkhead = bulkhead.clone();
            let entered = Arc::clone(&entered);
            let release = Arc::clone(&release);
            async move {
                bulkhead
                    .call(move || async move {
                        entered.notify_one();
                        release.notified().await;
                        Ok::<_, String>("first".to_string())
                    })
                    .await
            }
        });

        // Wait until the first call holds the only slot.
        entered.notified().await;
        assert_eq!(bulkhead.available(), 0);

        let invoked = AtomicU32::new(0);
        let second = bulkhead
            .call(|| async {
                invoked.fetch_add(1, Ordering::Relaxed);
                Ok::<_, String>("second".to_string())
            })
            .await;

        assert!(matches!(second, Err(BulkheadError::Full)));
        assert_eq!(invoked.load(Ordering::Relaxed), 0);

        // Once the slot is released a new attempt succeeds.
        release.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), "first");
        assert_eq!(bulkhead.available(), 1);

        let third = bulkhead.call(|| async { Ok::<_, String>("third".to_string()) }).await;
        assert_eq!(third.unwrap(), "third");
    }

    #[tokio::test]
    async fn test_capacity_admits_up_to_limit() {
        let bulkhead = Bulkhead::new(BulkheadConfig { capacity: 3 });

        let release = Arc::new(Notify::new());
        let mut handles = vec![];
        for _ in 0..3 {
            let bulkhead = bulkhead.clone();
            let release = Arc::clone(&release);
            handles.push(tokio::spawn(async move {
                bulkhead
                    .call(move || async move {
                        release.notified().await;
                        Ok::<_, String>(())
                    })
                    .await
            }));
        }

        // Give all three a chance to claim their slots.
        tokio::task::yield_now().await;
        while bulkhead.available() > 0 {
            tokio::task::yield_now().await;
        }

        let overflow = bulkhead.call(|| async { Ok::<_, String>(()) }).await;
        assert!(matches!(overflow, Err(BulkheadError::Full)));

        release.notify_waiters();
        for handle in handles {
            assert!(handle.await.unwrap().is_ok());
        }
        assert_eq!(bulkhead.available(), 3);
    }

    #[test]
    fn test_error_display() {
        let full: BulkheadError<String> = BulkheadError::Full;
        assert_eq!(full.to_string(), "Bulkhead is full");
    }
}
