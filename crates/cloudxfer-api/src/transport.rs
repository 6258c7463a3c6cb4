//! Retrying HTTP transport
//!
//! [`RetryingTransport`] owns one pooled `reqwest::Client` shared by every
//! worker of a batch and wraps each request with bounded retries.
//!
//! ## Retry schedule
//!
//! With the default [`RetryPolicy`] a request is attempted at most 4 times.
//! The first attempt is sent immediately; the waits before attempts 2, 3 and
//! 4 are 1s, 2s and 4s (`base * 2^(n-2)`, capped at `max_delay`). A 429
//! response carrying `Retry-After` replaces the computed wait.
//!
//! Retryable: HTTP 429, 500, 502, 503, 504, connect errors, timeouts and
//! connections dropped mid-request. Any other non-success status surfaces
//! immediately.

use std::future::Future;
use std::time::Duration;

use cloudxfer_core::config::Config;
use cloudxfer_core::domain::RemoteError;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, info, warn};

/// Wait used when a 429 carries no usable `Retry-After`
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Lower bound of the idle connection pool per host
const MIN_POOL_SIZE: usize = 20;

// ============================================================================
// RetryPolicy
// ============================================================================

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Wait before the second attempt
    pub base_delay: Duration,
    /// Cap for any single wait
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// A policy that sends every request exactly once
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Wait before the given 1-based attempt
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exponent = (attempt - 2).min(31);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Waits before every attempt, in order
    pub fn schedule(&self) -> Vec<Duration> {
        (1..=self.max_attempts.max(1))
            .map(|attempt| self.delay_before(attempt))
            .collect()
    }
}

// ============================================================================
// TransportSettings
// ============================================================================

/// Which timeout applies to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Listing, links, folder creation, account calls
    Metadata,
    /// Upload and download bodies
    Transfer,
}

/// Tunables for building a [`RetryingTransport`]
#[derive(Debug, Clone)]
pub struct TransportSettings {
    /// Concurrent callers the pool must serve without waiting for a connection
    pub workers: usize,
    pub metadata_timeout: Duration,
    pub transfer_timeout: Duration,
    pub connect_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            workers: 4,
            metadata_timeout: Duration::from_secs(30),
            transfer_timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl TransportSettings {
    /// Derives settings from the `api` and `retry` sections of a [`Config`]
    pub fn from_config(config: &Config) -> Self {
        Self {
            workers: config.transfer_config().workers,
            metadata_timeout: config.api.metadata_timeout(),
            transfer_timeout: config.api.transfer_timeout(),
            connect_timeout: config.api.connect_timeout(),
            retry: RetryPolicy {
                max_attempts: config.retry.max_attempts.max(1),
                base_delay: Duration::from_millis(config.retry.base_delay_ms),
                max_delay: Duration::from_millis(config.retry.max_delay_ms),
            },
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Idle connections kept per host
    pub fn pool_size(&self) -> usize {
        (self.workers * 2).max(MIN_POOL_SIZE)
    }
}

// ============================================================================
// RetryingTransport
// ============================================================================

/// Pooled HTTP client with retry and timeout handling
#[derive(Debug, Clone)]
pub struct RetryingTransport {
    client: Client,
    settings: TransportSettings,
}

impl RetryingTransport {
    /// Builds the pooled client
    ///
    /// # Errors
    /// Returns `RemoteError::InvalidResponse` if the TLS backend cannot be
    /// initialised.
    pub fn new(settings: TransportSettings) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .pool_max_idle_per_host(settings.pool_size())
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(settings.connect_timeout)
            .tcp_keepalive(Duration::from_secs(60))
            .user_agent(concat!("cloudxfer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::InvalidResponse(format!("failed to build HTTP client: {e}")))?;

        debug!(
            pool_size = settings.pool_size(),
            max_attempts = settings.retry.max_attempts,
            "Built HTTP transport"
        );

        Ok(Self { client, settings })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.settings.retry
    }

    fn timeout_for(&self, kind: RequestKind) -> Duration {
        match kind {
            RequestKind::Metadata => self.settings.metadata_timeout,
            RequestKind::Transfer => self.settings.transfer_timeout,
        }
    }

    /// Sends a request, retrying transient failures.
    ///
    /// `build` is called once per attempt so that streaming bodies can be
    /// re-created from the start. An error returned by `build` aborts
    /// without retrying.
    ///
    /// Returns the first response with a success status.
    pub async fn send<F, Fut>(
        &self,
        label: &str,
        kind: RequestKind,
        mut build: F,
    ) -> Result<Response, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<RequestBuilder, RemoteError>>,
    {
        let policy = self.settings.retry;
        let max_attempts = policy.max_attempts.max(1);
        let mut retry_after: Option<Duration> = None;
        let mut last_error = RemoteError::Transient(format!("{label}: no attempt made"));

        for attempt in 1..=max_attempts {
            let delay = match retry_after.take() {
                Some(server_wait) => server_wait.min(policy.max_delay),
                None => policy.delay_before(attempt),
            };
            if !delay.is_zero() {
                warn!(
                    label,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %last_error,
                    "Transient failure, backing off"
                );
                tokio::time::sleep(delay).await;
            }

            let request = build().await?.timeout(self.timeout_for(kind));

            match request.send().await {
                Ok(response) if response.status().is_success() => {
                    if attempt > 1 {
                        info!(label, attempt, "Request succeeded after retry");
                    }
                    return Ok(response);
                }
                Ok(response) => {
                    let status = response.status();
                    if !is_retryable_status(status) {
                        return Err(status_error(label, status));
                    }
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        retry_after = Some(
                            response
                                .headers()
                                .get(reqwest::header::RETRY_AFTER)
                                .and_then(|v| v.to_str().ok())
                                .map(|v| parse_retry_after(v, DEFAULT_RETRY_AFTER))
                                .unwrap_or_else(|| policy.delay_before(attempt + 1)),
                        );
                    }
                    last_error = RemoteError::Transient(format!("{label}: HTTP {status}"));
                }
                Err(e) if is_transient_error(&e) => {
                    last_error = RemoteError::Transient(format!("{label}: {e}"));
                }
                Err(e) => {
                    return Err(RemoteError::InvalidResponse(format!("{label}: {e}")));
                }
            }
        }

        warn!(label, attempts = max_attempts, error = %last_error, "Retry budget exhausted");
        Err(last_error)
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Whether a response status is worth another attempt
pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

/// Whether a transport-level error is worth another attempt
pub fn is_transient_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect() || error.is_request() || error.is_body()
}

/// Maps a non-retryable status to a `RemoteError`
pub fn status_error(label: &str, status: StatusCode) -> RemoteError {
    let reason = status.canonical_reason().unwrap_or("unexpected status");
    match status {
        StatusCode::UNAUTHORIZED => RemoteError::Unauthorized(format!("{label}: {reason}")),
        StatusCode::NOT_FOUND | StatusCode::GONE => {
            RemoteError::NotFound(format!("{label}: {reason}"))
        }
        _ => RemoteError::Http {
            status: status.as_u16(),
            message: format!("{label}: {reason}"),
        },
    }
}

/// Parses a `Retry-After` header value.
///
/// Supports delta-seconds (`"120"`) and HTTP-dates. Falls back to `default`
/// when the value cannot be parsed or the date lies in the past.
pub fn parse_retry_after(value: &str, default: Duration) -> Duration {
    if let Ok(seconds) = value.trim().parse::<u64>() {
        return Duration::from_secs(seconds);
    }

    if let Ok(date) = chrono::DateTime::parse_from_rfc2822(value.trim()) {
        let diff = date.with_timezone(&chrono::Utc) - chrono::Utc::now();
        if let Ok(wait) = diff.to_std() {
            return wait;
        }
    }

    warn!(value, "Could not parse Retry-After header, using default");
    default
}
