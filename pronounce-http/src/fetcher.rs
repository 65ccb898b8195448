use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::RwLock;
use url::Url;

use crate::{FetchError, RetryPolicy, Session};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where dictionary pages live: `<scheme>://<language>.<base_domain><path>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Upstream {
    pub scheme: String,
    pub base_domain: String,
}

impl Default for Upstream {
    fn default() -> Self {
        Self {
            scheme: "https".to_string(),
            base_domain: "thefreedictionary.com".to_string(),
        }
    }
}

impl Upstream {
    /// Literal concatenation; `path` is not escaped.
    ///
    /// ```
    /// use pronounce_http::Upstream;
    ///
    /// let up = Upstream::default();
    /// assert_eq!(up.page_url("en", "/cat"), "https://en.thefreedictionary.com/cat");
    /// ```
    pub fn page_url(&self, language: &str, path: &str) -> String {
        format!(
            "{}://{}.{}{}",
            self.scheme, language, self.base_domain, path
        )
    }

    /// Host name serving `language`, handy for pinning with
    /// [`FetcherBuilder::resolve`].
    pub fn host_for(&self, language: &str) -> String {
        format!("{}.{}", language, self.base_domain)
    }
}

pub struct FetcherBuilder {
    upstream: Upstream,
    timeout: Duration,
    policy: RetryPolicy,
    pins: Vec<(String, SocketAddr)>,
}

impl Default for FetcherBuilder {
    fn default() -> Self {
        Self {
            upstream: Upstream::default(),
            timeout: DEFAULT_TIMEOUT,
            policy: RetryPolicy::default(),
            pins: Vec::new(),
        }
    }
}

impl FetcherBuilder {
    pub fn upstream(mut self, upstream: Upstream) -> Self {
        self.upstream = upstream;
        self
    }

    /// Per-attempt timeout (connect through end of body).
    pub fn timeout(mut self, dur: Duration) -> Self {
        self.timeout = dur;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Pin `host` to `addr`, bypassing DNS and proxies. Survives rebuilds.
    pub fn resolve(mut self, host: impl Into<String>, addr: SocketAddr) -> Self {
        self.pins.push((host.into(), addr));
        self
    }

    pub fn build(self) -> Result<Fetcher, FetchError> {
        let session = Session::build(&self.policy, &self.pins, 0)?;
        Ok(Fetcher {
            upstream: self.upstream,
            timeout: self.timeout,
            policy: self.policy,
            pins: self.pins,
            session: RwLock::new(session),
        })
    }
}

/// Fetches dictionary pages through a shared, self-healing [`Session`].
///
/// The session lives behind an async read/write lock. Readers clone it and
/// drop the lock before any I/O; a failed request swaps in a new session,
/// and callers that saw the same broken generation share one rebuild.
pub struct Fetcher {
    upstream: Upstream,
    timeout: Duration,
    policy: RetryPolicy,
    pins: Vec<(String, SocketAddr)>,
    session: RwLock<Session>,
}

impl Fetcher {
    /// Default fetcher: thefreedictionary.com over HTTPS, 10 s timeout,
    /// three status retries.
    ///
    /// ```no_run
    /// use pronounce_http::{FetchError, Fetcher};
    /// use std::time::Duration;
    ///
    /// let fetcher = Fetcher::new()?;
    /// assert_eq!(fetcher.timeout(), Duration::from_secs(10));
    /// # Ok::<(), FetchError>(())
    /// ```
    pub fn new() -> Result<Self, FetchError> {
        Self::builder().build()
    }

    pub fn builder() -> FetcherBuilder {
        FetcherBuilder::default()
    }

    pub fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Number of session rebuilds so far.
    pub async fn generation(&self) -> u64 {
        self.session.read().await.generation()
    }

    /// Fetch the page at `path` on the `language` subdomain as text.
    ///
    /// Any transport failure (timeout, refused connection, broken body)
    /// rebuilds the session and retries once. The second failure is returned.
    pub async fn get(&self, language: &str, path: &str) -> Result<String, FetchError> {
        let raw = self.upstream.page_url(language, path);
        tracing::info!(url = %raw, "fetch.url");
        let url = Url::parse(&raw).map_err(|e| FetchError::Url {
            url: raw.clone(),
            message: e.to_string(),
        })?;

        let session = self.session.read().await.clone();
        let first = match session.get_text(&url, self.timeout).await {
            Ok(body) => return Ok(body),
            Err(err) => err,
        };

        tracing::warn!(
            url = %url,
            generation = session.generation(),
            error = %first,
            "fetch.rebuilding_session"
        );
        let fresh = self.rebuild(session.generation()).await?;
        fresh.get_text(&url, self.timeout).await.map_err(|err| {
            tracing::warn!(
                url = %url,
                generation = fresh.generation(),
                error = %err,
                "fetch.failed"
            );
            err
        })
    }

    async fn rebuild(&self, failed_generation: u64) -> Result<Session, FetchError> {
        let mut current = self.session.write().await;
        if current.generation() == failed_generation {
            *current = Session::build(&self.policy, &self.pins, failed_generation + 1)?;
        }
        Ok(current.clone())
    }
}
