//! Error types for the breakwater client.
//!
//! This module defines the concrete error type surfaced by
//! [`ResilientClient`](crate::http::ResilientClient). The guard primitives in
//! [`reliability`](crate::reliability) carry their own generic error enums
//! ([`CircuitBreakerError`](crate::reliability::CircuitBreakerError),
//! [`BulkheadError`](crate::reliability::BulkheadError)); this type is what
//! those flatten into at the HTTP boundary.
//!
//! # Error Categories
//!
//! - **Guard rejections** ([`ClientError::CircuitOpen`],
//!   [`ClientError::BulkheadFull`]): the operation was never attempted
//! - **Operation failures** ([`ClientError::Http`],
//!   [`ClientError::ServerError`]): the operation ran and failed
//! - **Caller mistakes** ([`ClientError::InvalidUrl`],
//!   [`ClientError::InvalidConfig`]): rejected before any guard is consulted
//!
//! Callers that want different handling for "rejected by a guard" versus "the
//! call itself failed" can match on the variant; nothing is wrapped or
//! translated beyond the two fast-fail sentinels.

use thiserror::Error;

use crate::http::HttpResponse;

/// Result type alias for client operations.
///
/// All fallible functions at the HTTP boundary of this crate return this type.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors surfaced by the resilient HTTP client.
///
/// Guard rejections mean the request was never sent; everything else
/// propagates unmodified from the underlying call.
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum ClientError {
    /// The circuit breaker is open; the request was not sent.
    ///
    /// The breaker tripped after too many recent failures and is fast-failing
    /// calls until its open timeout elapses and a trial succeeds.
    ///
    /// # Recovery
    ///
    /// Wait for the configured `open_timeout`; the breaker transitions to
    /// half-open on its own and begins admitting trial calls.
    #[error("Circuit breaker is open")]
    CircuitOpen,

    /// The bulkhead has no free slot; the request was not sent.
    ///
    /// All `capacity` concurrent executions are in flight. There is no
    /// queuing: admission is either instantaneous or instantaneous rejection.
    ///
    /// # Recovery
    ///
    /// Retry once an in-flight call completes, or raise `capacity` if the
    /// downstream can tolerate more concurrency.
    #[error("Bulkhead is full")]
    BulkheadFull,

    /// HTTP transport failure.
    ///
    /// Wraps [`reqwest::Error`]: timeouts, connection refusals, DNS failures,
    /// TLS errors. Counts as a failure toward the circuit breaker threshold.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a 5xx status.
    ///
    /// Carries the full response so callers can still inspect headers and
    /// body. Counts as a failure toward the circuit breaker threshold;
    /// client-error (4xx) responses do not.
    #[error("Server returned status {}", .0.status)]
    ServerError(HttpResponse),

    /// The request URL could not be parsed.
    ///
    /// Rejected before any guard is consulted, so it never counts toward the
    /// breaker threshold and never occupies a bulkhead slot.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Returns `true` if the error is a guard rejection, meaning the request
    /// was never sent.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::CircuitOpen | Self::BulkheadFull)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ClientError::CircuitOpen;
        assert_eq!(error.to_string(), "Circuit breaker is open");

        let error = ClientError::BulkheadFull;
        assert_eq!(error.to_string(), "Bulkhead is full");
    }

    #[test]
    fn test_server_error_display_includes_status() {
        let response = HttpResponse { status: 503, headers: vec![], body: vec![] };
        let error = ClientError::ServerError(response);
        assert_eq!(error.to_string(), "Server returned status 503");
    }

    #[test]
    fn test_invalid_url_error() {
        let error = ClientError::InvalidUrl("not-a-url".to_owned());
        assert_eq!(error.to_string(), "Invalid request URL: not-a-url");
    }

    #[test]
    fn test_is_rejection() {
        assert!(ClientError::CircuitOpen.is_rejection());
        assert!(ClientError::BulkheadFull.is_rejection());
        assert!(!ClientError::InvalidUrl("x".to_owned()).is_rejection());

        let response = HttpResponse { status: 500, headers: vec![], body: vec![] };
        assert!(!ClientError::ServerError(response).is_rejection());
    }
}
