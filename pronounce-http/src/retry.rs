use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Method, StatusCode};
use std::time::Duration;

/// Upper bound for any single backoff sleep.
pub const BACKOFF_MAX: Duration = Duration::from_secs(120);

/// Status-driven retry rules applied inside a [`Session`](crate::Session).
///
/// Transport errors are not retried here; they bubble up to the
/// [`Fetcher`](crate::Fetcher), which rebuilds the session instead.
///
/// ```
/// use pronounce_http::RetryPolicy;
/// use reqwest::{Method, StatusCode};
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_retries, 3);
/// assert!(policy.is_retryable(&Method::GET, StatusCode::BAD_GATEWAY));
/// assert!(!policy.is_retryable(&Method::POST, StatusCode::BAD_GATEWAY));
/// assert_eq!(policy.backoff(1), Duration::ZERO);
/// assert_eq!(policy.backoff(3), Duration::from_secs(4));
/// ```
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_retries: usize,
    /// Delay before retry `n` is `backoff_factor * 2^(n-1)`, except that the
    /// first retry goes out immediately.
    pub backoff_factor: Duration,
    pub status_forcelist: Vec<StatusCode>,
    pub allowed_methods: Vec<Method>,
    /// Honor a numeric `Retry-After` on 429/503 instead of the computed backoff.
    pub respect_retry_after: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_factor: Duration::from_secs(1),
            status_forcelist: vec![
                StatusCode::TOO_MANY_REQUESTS,
                StatusCode::INTERNAL_SERVER_ERROR,
                StatusCode::BAD_GATEWAY,
                StatusCode::SERVICE_UNAVAILABLE,
                StatusCode::GATEWAY_TIMEOUT,
            ],
            allowed_methods: vec![Method::HEAD, Method::GET, Method::OPTIONS],
            respect_retry_after: true,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    pub fn with_backoff_factor(mut self, factor: Duration) -> Self {
        self.backoff_factor = factor;
        self
    }

    pub fn is_retryable(&self, method: &Method, status: StatusCode) -> bool {
        self.allowed_methods.contains(method) && self.status_forcelist.contains(&status)
    }

    /// Computed delay before the `retry`-th retry (1-based): 0, then
    /// `2 * factor`, `4 * factor`, ...
    pub fn backoff(&self, retry: usize) -> Duration {
        if retry <= 1 {
            return Duration::ZERO;
        }
        let exp = u32::try_from(retry - 1).unwrap_or(u32::MAX);
        self.backoff_factor
            .saturating_mul(2u32.saturating_pow(exp))
            .min(BACKOFF_MAX)
    }

    /// Delay to sleep before the `retry`-th retry of a response with `status`.
    pub fn delay_for(&self, retry: usize, status: StatusCode, headers: &HeaderMap) -> Duration {
        let honors_header = matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
        );
        if self.respect_retry_after && honors_header {
            if let Some(secs) = retry_after_secs(headers) {
                return Duration::from_secs(secs).min(BACKOFF_MAX);
            }
        }
        self.backoff(retry)
    }
}

fn retry_after_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .trim()
        .parse()
        .ok()
}
