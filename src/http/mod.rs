//! HTTP call adapter: the boundary collaborator fed into the guards.
//!
//! This module turns a structured [`HttpRequest`] into an invocation of the
//! underlying reqwest client and classifies the outcome for the circuit
//! breaker: a transport error or a response in the server-error class (5xx)
//! counts as a failure; every other outcome, client-error responses
//! included, counts as a success. The guards themselves never look inside a
//! request or response.
//!
//! # Examples
//!
//! ```rust,no_run
//! use breakwater::{
//!     http::{ClientConfig, HttpRequest, ResilientClient},
//!     reliability::{BulkheadConfig, CircuitBreakerConfig},
//! };
//!
//! # async fn example() -> breakwater::Result<()> {
//! let config = ClientConfig {
//!     breaker: Some(CircuitBreakerConfig { max_failures: 2, ..Default::default() }),
//!     bulkhead: Some(BulkheadConfig { capacity: 4 }),
//!     ..ClientConfig::default()
//! };
//! let client = ResilientClient::new(&config)?;
//!
//! let request = HttpRequest::get("https://api.example.com/items")
//!     .query("page", "1")
//!     .header("Accept", "application/json");
//!
//! let response = client.call(&request).await?;
//! println!("status: {}", response.status);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;

pub use client::ResilientClient;
pub use config::{ClientConfig, HttpConfig};
pub use reqwest::Method;

/// A structured outbound request.
///
/// Plain data: method, URL, query pairs, header pairs, body bytes. The
/// guards treat this as opaque; only [`ResilientClient::call`] interprets it.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Request URL, without the query pairs below.
    pub url: String,
    /// Query parameters appended to any already present in the URL.
    pub query: Vec<(String, String)>,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// Request body bytes; empty means no body.
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Creates a request with the given method and URL.
    #[must_use]
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), query: Vec::new(), headers: Vec::new(), body: Vec::new() }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Creates a PUT request.
    #[must_use]
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    /// Creates a DELETE request.
    #[must_use]
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Appends a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Sets the body bytes.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// A received response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: Vec<(String, String)>,
    /// Raw response body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Returns `true` for 2xx statuses.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns `true` for 5xx statuses - the class the circuit breaker
    /// counts as a failure.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Returns the body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder_chain() {
        let request = HttpRequest::post("https://api.example.com/orders")
            .query("dry_run", "true")
            .header("Content-Type", "application/json")
            .header("X-Request-Id", "abc-123")
            .body(&b"{\"amount\":42}"[..]);

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url, "https://api.example.com/orders");
        assert_eq!(request.query, vec![("dry_run".to_owned(), "true".to_owned())]);
        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.body, b"{\"amount\":42}");
    }

    #[test]
    fn test_request_defaults_empty() {
        let request = HttpRequest::get("https://example.com");
        assert_eq!(request.method, Method::GET);
        assert!(request.query.is_empty());
        assert!(request.headers.is_empty());
        assert!(request.body.is_empty());
    }

    #[test]
    fn test_request_method_constructors() {
        assert_eq!(HttpRequest::get("u").method, Method::GET);
        assert_eq!(HttpRequest::post("u").method, Method::POST);
        assert_eq!(HttpRequest::put("u").method, Method::PUT);
        assert_eq!(HttpRequest::delete("u").method, Method::DELETE);
    }

    #[test]
    fn test_response_status_classes() {
        let ok = HttpResponse { status: 204, headers: vec![], body: vec![] };
        assert!(ok.is_success());
        assert!(!ok.is_server_error());

        // Client errors are not failures from the breaker's point of view.
        let not_found = HttpResponse { status: 404, headers: vec![], body: vec![] };
        assert!(!not_found.is_success());
        assert!(!not_found.is_server_error());

        let unavailable = HttpResponse { status: 503, headers: vec![], body: vec![] };
        assert!(unavailable.is_server_error());
    }

    #[test]
    fn test_response_body_text() {
        let response =
            HttpResponse { status: 200, headers: vec![], body: b"hello".to_vec() };
        assert_eq!(response.body_text(), "hello");
    }
}
