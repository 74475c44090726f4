//! Resilient HTTP client: reqwest wrapped in the configured guards.

use std::sync::LazyLock;
use std::time::Duration;

use reqwest::Client;
use tracing::instrument;
use url::Url;

use super::{ClientConfig, HttpRequest, HttpResponse};
use crate::{
    error::{ClientError, Result},
    reliability::{Bulkhead, CircuitBreaker, ExecuteError, Executor},
};

/// Default HTTP client with connection pooling enabled.
///
/// Using a singleton avoids recreating the client per instance, preserving
/// connection pooling benefits across all unguarded clients.
static DEFAULT_HTTP_CLIENT: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .pool_max_idle_per_host(100)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create default HTTP client")
});

/// Parses the request URL and appends its query pairs.
fn build_url(raw: &str, query: &[(String, String)]) -> Result<Url> {
    let mut url =
        Url::parse(raw).map_err(|e| ClientError::InvalidUrl(format!("{raw}: {e}")))?;
    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query {
            pairs.append_pair(key, value);
        }
    }
    Ok(url)
}

/// HTTP client guarded by an optional circuit breaker and bulkhead.
///
/// Every instance owns its guards; nothing is shared process-wide. The
/// breaker's failure classification is fixed here: a transport error or a
/// 5xx response counts as a failure, everything else - 4xx responses
/// included - counts as a success.
///
/// # Examples
///
/// ```rust,no_run
/// use breakwater::{
///     http::{ClientConfig, HttpRequest, ResilientClient},
///     reliability::CircuitBreakerConfig,
/// };
///
/// # async fn example() -> breakwater::Result<()> {
/// let config = ClientConfig {
///     breaker: Some(CircuitBreakerConfig::default()),
///     ..ClientConfig::default()
/// };
/// let client = ResilientClient::new(&config)?;
///
/// let response = client.call(&HttpRequest::get("https://api.example.com/health")).await?;
/// assert!(response.is_success());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ResilientClient {
    client: Client,
    executor: Executor,
}

impl ResilientClient {
    /// Creates a client from the given configuration.
    ///
    /// Builds the reqwest client from the `http` section and installs
    /// whichever guards are configured.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidConfig`] for out-of-range settings and
    /// [`ClientError::Http`] if the underlying client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .pool_max_idle_per_host(config.http.pool_max_idle_per_host)
            .timeout(config.http.timeout())
            .connect_timeout(config.http.connect_timeout())
            .build()?;

        let mut executor = Executor::new();
        if let Some(breaker) = &config.breaker {
            executor = executor.with_breaker(CircuitBreaker::new(breaker.clone()));
        }
        if let Some(bulkhead) = &config.bulkhead {
            executor = executor.with_bulkhead(Bulkhead::new(bulkhead.clone()));
        }

        Ok(Self { client, executor })
    }

    /// Creates a client with no guards, sharing the default pooled client.
    #[must_use]
    pub fn unguarded() -> Self {
        Self { client: DEFAULT_HTTP_CLIENT.clone(), executor: Executor::new() }
    }

    /// Returns the installed circuit breaker, if any.
    ///
    /// Useful for registering state-change listeners or inspecting state.
    #[must_use]
    pub fn breaker(&self) -> Option<&CircuitBreaker> {
        self.executor.breaker()
    }

    /// Returns the installed bulkhead, if any.
    #[must_use]
    pub fn bulkhead(&self) -> Option<&Bulkhead> {
        self.executor.bulkhead()
    }

    /// Sends the request through the configured guards.
    ///
    /// URL parsing happens before any guard is consulted, so a malformed URL
    /// neither occupies a bulkhead slot nor counts as a breaker failure.
    ///
    /// # Errors
    ///
    /// - [`ClientError::CircuitOpen`] / [`ClientError::BulkheadFull`]: the
    ///   request was rejected without being sent
    /// - [`ClientError::Http`]: the transport failed
    /// - [`ClientError::ServerError`]: the server answered with a 5xx status
    /// - [`ClientError::InvalidUrl`]: the URL did not parse
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    pub async fn call(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let url = build_url(&request.url, &request.query)?;

        match self.executor.execute(|| self.send(url, request)).await {
            Ok(response) => Ok(response),
            Err(ExecuteError::CircuitOpen) => Err(ClientError::CircuitOpen),
            Err(ExecuteError::BulkheadFull) => Err(ClientError::BulkheadFull),
            Err(ExecuteError::Inner(e)) => Err(e),
        }
    }

    /// Sends the request once and classifies the outcome for the guards.
    async fn send(&self, url: Url, request: &HttpRequest) -> Result<HttpResponse> {
        let mut builder = self.client.request(request.method.clone(), url);
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body.clone());
        }

        let response = builder.send().await?;

        let status = response.status().as_u16();
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_owned()))
            .collect();
        let body = response.bytes().await?.to_vec();

        let response = HttpResponse { status, headers, body };
        if response.is_server_error() {
            tracing::debug!(status, "Server error response, counted as failure");
            return Err(ClientError::ServerError(response));
        }
        Ok(response)
    }
}
