//! Resilient page fetcher for thefreedictionary.com.
//!
//! - One reusable [`Session`] (a `reqwest::Client` with spoofed browser headers)
//! - Status-driven retries inside the session via [`RetryPolicy`]
//!   (429/500/502/503/504, exponential backoff, `Retry-After` support)
//! - On any transport failure the [`Fetcher`] rebuilds the session once and
//!   reissues the request; a second failure is returned to the caller
//!
//! Example (no_run):
//! ```rust
//! # async fn demo() -> Result<(), pronounce_http::FetchError> {
//! let fetcher = pronounce_http::Fetcher::new()?;
//! let html = fetcher.get("en", "/hello").await?;
//! assert!(!html.is_empty());
//! # Ok(()) }
//! ```
//!
//! Observability: every fetch emits a `fetch.url` event with the target URL;
//! retries, rebuilds and final failures are logged at `warn`.

mod fetcher;
mod retry;
mod session;

pub use fetcher::{Fetcher, FetcherBuilder, Upstream};
pub use retry::{BACKOFF_MAX, RetryPolicy};
pub use session::{ACCEPT_LANGUAGE_VALUE, Session, USER_AGENT_VALUE};

use thiserror::Error;

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL {url}: {message}")]
    Url { url: String, message: String },
    #[error("client build failed: {0}")]
    Build(String),
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },
}

impl FetchError {
    pub(crate) fn from_reqwest(url: &url::Url, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Network {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    }
}
