//! Circuit breaker pattern for protecting against cascading failures.
//!
//! The circuit breaker stops repeated calls to a failing operation, giving it
//! time to recover while protecting the caller from burning resources on
//! requests that are doomed anyway.
//!
//! # States
//!
//! - **Closed**: normal operation, calls flow through
//! - **Open**: too many recent failures, calls are rejected immediately
//! - **`HalfOpen`**: probing recovery, trial calls allowed
//!
//! # State Transitions
//!
//! ```text
//! Closed ──[max_failures failures within window]──> Open
//!   ▲                                                 │
//!   │                                                 │ [open_timeout elapses,
//!   │                                                 │  background timer]
//!   │                                                 ▼
//!   └──[trial_limit successful trials]────────── HalfOpen
//!          [any trial failure] ─────────────────────> Open
//!          [trial_window exceeded] ─────────────────> Open
//! ```
//!
//! Unlike a purely lazy breaker, the Open → `HalfOpen` transition is driven by
//! a background timer task owned by the breaker, so the state advances even
//! when no caller is active. Re-entering Open restarts the timer; it is never
//! stacked.
//!
//! # Examples
//!
//! ```rust
//! use breakwater::reliability::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
//!
//! // Normal operation
//! let result = breaker.call(|| async { Ok::<_, String>("success".to_string()) }).await;
//!
//! assert!(result.is_ok());
//! assert_eq!(breaker.state(), CircuitState::Closed);
//! # Ok(())
//! # }
//! ```

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak},
    time::{Duration, Instant},
};

use serde::Deserialize;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::error::{ClientError, Result};

/// Circuit breaker state.
///
/// Closed is the initial state; there is no terminal state, the breaker
/// cycles for the lifetime of the owning client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation - calls are allowed.
    Closed,
    /// Breaker has tripped - calls are rejected without being invoked.
    Open,
    /// Probing recovery - a bounded trial of calls is allowed.
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => f.write_str("Closed"),
            Self::Open => f.write_str("Open"),
            Self::HalfOpen => f.write_str("HalfOpen"),
        }
    }
}

/// Configuration for a circuit breaker.
///
/// Deserializable from TOML; every field has a documented default so partial
/// configuration files work.
///
/// # Examples
///
/// ```rust
/// use breakwater::reliability::CircuitBreakerConfig;
///
/// // Defaults: 3 failures trip the breaker, 1s open timeout,
/// // unbounded failure window, a single trial success closes it.
/// let config = CircuitBreakerConfig::default();
/// assert_eq!(config.max_failures, 3);
/// assert_eq!(config.open_timeout_ms, 1000);
///
/// // Tighter breaker: trip after 2 failures inside 500ms, require 3
/// // trial successes within 2s to close again.
/// let strict = CircuitBreakerConfig {
///     max_failures: 2,
///     window_ms: 500,
///     trial_limit: 3,
///     trial_window_ms: 2000,
///     ..CircuitBreakerConfig::default()
/// };
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Number of failures within the window that trips the breaker.
    ///
    /// Must be at least 1. Default: 3.
    #[serde(default = "default_max_failures")]
    pub max_failures: usize,

    /// Failure-counting horizon in milliseconds.
    ///
    /// `0` means failures accumulate without time-based expiry until a
    /// successful call or a trip clears them. Default: 0.
    #[serde(default)]
    pub window_ms: u64,

    /// How long the breaker stays Open before auto half-opening, in
    /// milliseconds. Default: 1000.
    #[serde(default = "default_open_timeout_ms")]
    pub open_timeout_ms: u64,

    /// Consecutive successful trial calls required in `HalfOpen` to close the
    /// breaker.
    ///
    /// `0` means a single success closes it. Default: 0.
    #[serde(default)]
    pub trial_limit: u32,

    /// Time budget in milliseconds for completing the trial.
    ///
    /// If the breaker is still `HalfOpen` when the budget runs out, the next
    /// call forces it back to Open. `0` disables the budget. Default: 0.
    #[serde(default)]
    pub trial_window_ms: u64,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            max_failures: default_max_failures(),
            window_ms: 0,
            open_timeout_ms: default_open_timeout_ms(),
            trial_limit: 0,
            trial_window_ms: 0,
        }
    }
}

impl CircuitBreakerConfig {
    /// Validates configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] if `max_failures` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_failures == 0 {
            return Err(ClientError::InvalidConfig(
                "breaker.max_failures must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns the failure-counting window as a [`Duration`].
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Returns the open timeout as a [`Duration`].
    #[must_use]
    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }

    /// Returns the trial window as a [`Duration`].
    #[must_use]
    pub fn trial_window(&self) -> Duration {
        Duration::from_millis(self.trial_window_ms)
    }
}

fn default_max_failures() -> usize {
    3
}

fn default_open_timeout_ms() -> u64 {
    1000
}

/// State-change observer callback.
type StateListener = Box<dyn Fn(CircuitState) + Send + Sync>;

/// Mutable breaker state, all guarded by a single lock.
///
/// The lock is scoped strictly to state reads and writes; the guarded
/// operation itself always runs outside it.
struct Core {
    state: CircuitState,
    /// Failure timestamps inside the current counting window, oldest first.
    failures: Vec<Instant>,
    trial_count: u32,
    trial_started_at: Option<Instant>,
    /// Pending Open -> HalfOpen timer task, if any.
    open_timer: Option<JoinHandle<()>>,
    /// Incremented on every (re-)arm so a stale timer that already passed its
    /// sleep cannot apply an outdated transition.
    timer_epoch: u64,
}

struct Inner {
    config: CircuitBreakerConfig,
    core: Mutex<Core>,
    listeners: RwLock<Vec<StateListener>>,
}

/// Circuit breaker guarding an arbitrary fallible async operation.
///
/// Cheap to clone: clones share the same underlying state, so one breaker can
/// guard calls from many concurrent tasks. Counters and state live behind a
/// single exclusive lock scoped to reads/writes only; a slow guarded call
/// never blocks other callers' state inspection.
///
/// The Open → `HalfOpen` transition runs on a background tokio task. The task
/// holds only a weak reference, so dropping the last breaker handle turns a
/// pending timer into a no-op instead of leaking it.
///
/// # Examples
///
/// ```rust
/// use breakwater::reliability::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};
///
/// # async fn example() {
/// let breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
///
/// let result = breaker.call(|| async { Err::<String, _>("downstream failed") }).await;
///
/// match result {
///     Ok(value) => println!("got: {value}"),
///     Err(CircuitBreakerError::Open) => println!("rejected, breaker is open"),
///     Err(CircuitBreakerError::Inner(e)) => println!("operation failed: {e}"),
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct CircuitBreaker {
    inner: Arc<Inner>,
}

impl fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("state", &self.state())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl CircuitBreaker {
    /// Creates a new circuit breaker in the Closed state.
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                core: Mutex::new(Core {
                    state: CircuitState::Closed,
                    failures: Vec::new(),
                    trial_count: 0,
                    trial_started_at: None,
                    open_timer: None,
                    timer_epoch: 0,
                }),
                listeners: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> CircuitState {
        self.lock_core().state
    }

    /// Registers a state-change observer.
    ///
    /// Every observer is invoked synchronously, exactly once per real state
    /// change, with the new state. No callback fires for a no-op set to the
    /// same state. Observers run while the breaker's lock is held and must
    /// not call back into the breaker.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(CircuitState) + Send + Sync + 'static,
    {
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(listener));
    }

    /// Executes an operation through the circuit breaker.
    ///
    /// The operation is a zero-argument async closure invoked at most once.
    ///
    /// - **Open**: returns [`CircuitBreakerError::Open`] immediately; the
    ///   operation is never invoked.
    /// - **`HalfOpen` past its trial window**: transitions back to Open,
    ///   re-arms the timer, and returns [`CircuitBreakerError::Open`] without
    ///   invoking the operation.
    /// - **Otherwise**: runs the operation outside the lock, then records the
    ///   outcome. Failures append to the failure record (pruned to the
    ///   configured window) and trip the breaker at `max_failures`; a
    ///   `HalfOpen` failure re-opens immediately regardless of `trial_limit`.
    ///   Successes clear the record (Closed) or advance the trial
    ///   (`HalfOpen`).
    ///
    /// The fast-fail check and the post-call bookkeeping are two separate
    /// critical sections, so concurrent callers may act on a briefly stale
    /// state snapshot. That is the accepted best-effort trade-off: the lock
    /// is never held across the operation itself.
    ///
    /// # Errors
    ///
    /// Returns [`CircuitBreakerError::Open`] when rejected without invoking
    /// the operation, or [`CircuitBreakerError::Inner`] carrying the
    /// operation's own error unmodified.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> std::result::Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let snapshot = {
            let mut core = self.lock_core();
            let trial_window = self.inner.config.trial_window();
            if core.state == CircuitState::HalfOpen
                && trial_window > Duration::ZERO
                && core.trial_started_at.is_some_and(|t| t.elapsed() > trial_window)
            {
                tracing::warn!("Circuit breaker trial window exceeded, re-opening");
                self.set_state(&mut core, CircuitState::Open);
                self.arm_open_timer(&mut core);
                return Err(CircuitBreakerError::Open);
            }
            core.state
        };

        if snapshot == CircuitState::Open {
            return Err(CircuitBreakerError::Open);
        }

        // The operation runs without the lock so a slow call never blocks
        // other callers.
        let result = operation().await;

        let mut core = self.lock_core();
        match snapshot {
            CircuitState::Closed => match result {
                Ok(value) => {
                    core.failures.clear();
                    Ok(value)
                }
                Err(e) => {
                    self.record_failure(&mut core);
                    if core.failures.len() >= self.inner.config.max_failures {
                        core.failures.clear();
                        core.trial_count = 0;
                        self.set_state(&mut core, CircuitState::Open);
                        self.arm_open_timer(&mut core);
                    }
                    Err(CircuitBreakerError::Inner(e))
                }
            },
            CircuitState::HalfOpen => {
                core.trial_count += 1;
                match result {
                    Ok(value) => {
                        if self.inner.config.trial_limit == 0
                            || core.trial_count >= self.inner.config.trial_limit
                        {
                            self.set_state(&mut core, CircuitState::Closed);
                            core.failures.clear();
                            core.trial_count = 0;
                        }
                        Ok(value)
                    }
                    Err(e) => {
                        self.set_state(&mut core, CircuitState::Open);
                        self.arm_open_timer(&mut core);
                        Err(CircuitBreakerError::Inner(e))
                    }
                }
            }
            // The breaker opened between the snapshot and completion; pass
            // the outcome through untouched.
            CircuitState::Open => result.map_err(CircuitBreakerError::Inner),
        }
    }

    fn lock_core(&self) -> MutexGuard<'_, Core> {
        self.inner.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends a failure timestamp and prunes entries older than the window.
    fn record_failure(&self, core: &mut Core) {
        let now = Instant::now();
        core.failures.push(now);
        let window = self.inner.config.window();
        if window > Duration::ZERO {
            if let Some(cutoff) = now.checked_sub(window) {
                core.failures.retain(|t| *t > cutoff);
            }
        }
    }

    /// Applies a state transition and notifies observers.
    ///
    /// Must be called with the core lock held (enforced by the `&mut Core`
    /// argument).
    fn set_state(&self, core: &mut Core, next: CircuitState) {
        if core.state == next {
            return;
        }
        let previous = core.state;
        core.state = next;
        match next {
            CircuitState::Open => {
                tracing::warn!(%previous, "Circuit breaker opened");
            }
            CircuitState::HalfOpen => {
                tracing::info!("Circuit breaker half-open, probing recovery");
            }
            CircuitState::Closed => {
                tracing::info!("Circuit breaker closed, normal operation resumed");
            }
        }
        let listeners = self.inner.listeners.read().unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.iter() {
            listener(next);
        }
    }

    /// Arms the one-shot Open -> `HalfOpen` timer, cancelling any pending one.
    ///
    /// Exactly one timer is pending per Open period: re-arming aborts the
    /// previous task and bumps the epoch so a task already past its sleep
    /// cannot apply a stale transition. The spawned task holds only a weak
    /// reference; if the breaker is dropped the timer silently expires.
    fn arm_open_timer(&self, core: &mut Core) {
        if let Some(handle) = core.open_timer.take() {
            handle.abort();
        }
        core.timer_epoch = core.timer_epoch.wrapping_add(1);
        let epoch = core.timer_epoch;
        let timeout = self.inner.config.open_timeout();
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        core.open_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let breaker = CircuitBreaker { inner };
            let mut core = breaker.lock_core();
            if core.timer_epoch != epoch || core.state != CircuitState::Open {
                return;
            }
            breaker.set_state(&mut core, CircuitState::HalfOpen);
            core.trial_count = 0;
            core.trial_started_at = Some(Instant::now());
            core.open_timer = None;
        }));
    }
}

/// Error returned by [`CircuitBreaker::call`].
///
/// Distinguishes "the breaker rejected the call without attempting it" from
/// "the operation ran and failed". A rejection is never counted as a new
/// failure - the breaker is already open.
#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    /// The breaker is open; the operation was not invoked.
    #[error("Circuit breaker is open")]
    Open,

    /// The operation ran and failed; the inner error is passed through
    /// unmodified.
    #[error(transparent)]
    Inner(E),
}
