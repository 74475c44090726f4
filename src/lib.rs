//! breakwater: composable fault-tolerance guards for outbound HTTP calls.
//!
//! Two primitives protect a call to an unreliable remote operation from
//! cascading failure and unbounded concurrency:
//!
//! - **Circuit breaker**: fast-fails calls once failures exceed a threshold,
//!   later probing recovery through a bounded trial.
//! - **Bulkhead**: caps concurrent executions; admission is instantaneous or
//!   instantaneously rejected, never queued.
//!
//! An [`Executor`](reliability::Executor) composes zero, one, or both guards
//! around an arbitrary fallible async operation, and
//! [`ResilientClient`](http::ResilientClient) applies that composition to
//! outbound HTTP requests.
//!
//! # Architecture
//!
//! ```text
//! caller
//!   │  HttpRequest
//!   ▼
//! ┌──────────────────────────────────────────────┐
//! │ ResilientClient                              │
//! │   ┌────────────────────────────────────────┐ │
//! │   │ CircuitBreaker   "may this proceed?"   │ │
//! │   │   ┌──────────────────────────────────┐ │ │
//! │   │   │ Bulkhead    "is there capacity?" │ │ │
//! │   │   │   ┌────────────────────────────┐ │ │ │
//! │   │   │   │ reqwest    network call    │ │ │ │
//! │   │   │   └────────────────────────────┘ │ │ │
//! │   │   └──────────────────────────────────┘ │ │
//! │   └────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────┘
//!   │  HttpResponse, or a fast-fail sentinel
//!   ▼
//! caller
//! ```
//!
//! The breaker's fast-fail check runs before any bulkhead slot is consumed;
//! a bulkhead rejection surfaces to the breaker as an ordinary failure and
//! counts toward its threshold. Outcome classification at the HTTP boundary:
//! transport errors and 5xx responses are failures, everything else -
//! including 4xx - is a success.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use breakwater::{
//!     http::{ClientConfig, HttpRequest, ResilientClient},
//!     reliability::{BulkheadConfig, CircuitBreakerConfig, CircuitState},
//! };
//!
//! # async fn example() -> breakwater::Result<()> {
//! let config = ClientConfig {
//!     breaker: Some(CircuitBreakerConfig {
//!         max_failures: 2,
//!         window_ms: 500,
//!         open_timeout_ms: 2000,
//!         ..Default::default()
//!     }),
//!     bulkhead: Some(BulkheadConfig { capacity: 4 }),
//!     ..ClientConfig::default()
//! };
//!
//! let client = ResilientClient::new(&config)?;
//! if let Some(breaker) = client.breaker() {
//!     breaker.subscribe(|state| println!("breaker is now {state}"));
//! }
//!
//! let response = client.call(&HttpRequest::get("https://api.example.com/items")).await?;
//! println!("status: {}", response.status);
//! # Ok(())
//! # }
//! ```
//!
//! The guards also work directly, without HTTP, for any async operation:
//!
//! ```rust
//! use breakwater::reliability::{CircuitBreaker, CircuitBreakerConfig};
//!
//! # async fn example() -> Result<(), breakwater::reliability::CircuitBreakerError<String>> {
//! let breaker = CircuitBreaker::new(CircuitBreakerConfig::default());
//! let value = breaker.call(|| async { Ok::<_, String>(42) }).await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod error;
pub mod http;
pub mod reliability;

pub use error::{ClientError, Result};
pub use http::{ClientConfig, HttpRequest, HttpResponse, ResilientClient};
