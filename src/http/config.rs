//! Client configuration types.
//!
//! TOML-deserializable configuration with documented defaults. A complete
//! file looks like:
//!
//! ```toml
//! [http]
//! timeout_ms = 5000
//! connect_timeout_ms = 2000
//!
//! [breaker]
//! max_failures = 2
//! window_ms = 500
//! open_timeout_ms = 2000
//!
//! [bulkhead]
//! capacity = 4
//! ```
//!
//! Omitting the `[breaker]` or `[bulkhead]` table leaves that guard out
//! entirely; omitting individual fields falls back to their defaults.

use std::time::Duration;

use serde::Deserialize;

use crate::{
    error::{ClientError, Result},
    reliability::{BulkheadConfig, CircuitBreakerConfig},
};

/// HTTP transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Request deadline in milliseconds, covering connect through body.
    ///
    /// This is the only timeout the guards rely on: the breaker and bulkhead
    /// never cancel an in-flight call themselves. Default: 30000.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Connection deadline in milliseconds. Default: 10000.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Maximum idle pooled connections per host. Default: 100.
    #[serde(default = "default_pool_max_idle")]
    pub pool_max_idle_per_host: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            pool_max_idle_per_host: default_pool_max_idle(),
        }
    }
}

impl HttpConfig {
    /// Validates configuration values are within acceptable bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] if timeout values are outside
    /// valid ranges:
    /// - `timeout_ms`: must be 1-300000
    /// - `connect_timeout_ms`: must be 1-60000
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 || self.timeout_ms > 300_000 {
            return Err(ClientError::InvalidConfig(
                "http.timeout_ms must be between 1 and 300000".to_owned(),
            ));
        }
        if self.connect_timeout_ms == 0 || self.connect_timeout_ms > 60_000 {
            return Err(ClientError::InvalidConfig(
                "http.connect_timeout_ms must be between 1 and 60000".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns the request deadline as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Returns the connect deadline as a [`Duration`].
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_pool_max_idle() -> usize {
    100
}

/// Complete client configuration: transport plus optional guards.
///
/// Each guard is built only when its table is present, so the same struct
/// describes an unguarded client, a breaker-only client, a bulkhead-only
/// client, or a fully guarded one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    /// HTTP transport settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Circuit breaker settings; `None` means no breaker.
    #[serde(default)]
    pub breaker: Option<CircuitBreakerConfig>,

    /// Bulkhead settings; `None` means no bulkhead.
    #[serde(default)]
    pub bulkhead: Option<BulkheadConfig>,
}

impl ClientConfig {
    /// Validates the transport settings and whichever guard settings are
    /// present.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] for any out-of-range value.
    pub fn validate(&self) -> Result<()> {
        self.http.validate()?;
        if let Some(breaker) = &self.breaker {
            breaker.validate()?;
        }
        if let Some(bulkhead) = &self.bulkhead {
            bulkhead.validate()?;
        }
        Ok(())
    }
}
