use std::net::SocketAddr;
use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Method};
use tokio::time::sleep;
use url::Url;

use crate::{FetchError, RetryPolicy};

/// Desktop Edge identity; the dictionary site serves bot-looking clients a
/// stripped page.
pub const USER_AGENT_VALUE: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/105.0.0.0 Safari/537.36 Edg/105.0.1343.27";
pub const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.5";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE),
    );
    headers
}

/// Reusable connection context: pooled client, fixed headers and the retry
/// policy applied to every request sent through it.
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Clone, Debug)]
pub struct Session {
    client: Client,
    policy: RetryPolicy,
    generation: u64,
}

impl Session {
    /// Build a fresh session. `pins` maps host names to fixed socket
    /// addresses; pinned sessions connect directly and ignore proxy settings.
    pub fn build(
        policy: &RetryPolicy,
        pins: &[(String, SocketAddr)],
        generation: u64,
    ) -> Result<Self, FetchError> {
        let mut builder = Client::builder()
            .default_headers(browser_headers())
            .connect_timeout(CONNECT_TIMEOUT);
        if !pins.is_empty() {
            builder = builder.no_proxy();
            for (host, addr) in pins {
                builder = builder.resolve(host, *addr);
            }
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Build(e.to_string()))?;
        Ok(Self {
            client,
            policy: policy.clone(),
            generation,
        })
    }

    /// How many times the owning fetcher has rebuilt its session.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// GET `url` and return the body as text, whatever the status code.
    ///
    /// Retryable statuses are retried in place per the session's policy; once
    /// retries run out the last response body is returned as-is.
    pub async fn get_text(&self, url: &Url, timeout: Duration) -> Result<String, FetchError> {
        let method = Method::GET;
        let mut retries = 0usize;

        loop {
            tracing::debug!(
                generation = self.generation,
                attempt = retries + 1,
                max_retries = self.policy.max_retries,
                method = %method,
                host_path = %format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
                timeout_ms = millis(timeout),
                "http.request.start"
            );

            let t0 = Instant::now();
            let resp = self
                .client
                .request(method.clone(), url.clone())
                .timeout(timeout)
                .send()
                .await
                .map_err(|e| FetchError::from_reqwest(url, e))?;
            let status = resp.status();

            tracing::debug!(
                generation = self.generation,
                %status,
                duration_ms = millis(t0.elapsed()),
                "http.response.headers"
            );

            if retries < self.policy.max_retries && self.policy.is_retryable(&method, status) {
                retries += 1;
                let delay = self.policy.delay_for(retries, status, resp.headers());
                tracing::warn!(
                    generation = self.generation,
                    %status,
                    retry = retries,
                    max_retries = self.policy.max_retries,
                    backoff_ms = millis(delay),
                    "http.retrying"
                );
                drop(resp);
                sleep(delay).await;
                continue;
            }

            let body = resp
                .text()
                .await
                .map_err(|e| FetchError::from_reqwest(url, e))?;
            tracing::trace!(
                generation = self.generation,
                body_len = body.len(),
                body_snippet = %snip_body(&body),
                "http.response.body_snippet"
            );
            return Ok(body);
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn snip_body(body: &str) -> &str {
    match body.char_indices().nth(500) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_headers_carry_spoofed_identity() {
        let h = browser_headers();
        assert_eq!(h.get(USER_AGENT).unwrap(), USER_AGENT_VALUE);
        assert_eq!(h.get(ACCEPT_LANGUAGE).unwrap(), ACCEPT_LANGUAGE_VALUE);
    }

    #[test]
    fn snip_respects_char_boundaries() {
        let long = "猫".repeat(600);
        assert_eq!(snip_body(&long).chars().count(), 500);
        assert_eq!(snip_body("short"), "short");
    }

    #[test]
    fn millis_saturates() {
        assert_eq!(millis(Duration::from_millis(1500)), 1500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }

    #[test]
    fn build_keeps_policy_and_generation() {
        let policy = RetryPolicy::none();
        let pins = vec![("zh.example.test".to_string(), "127.0.0.1:9".parse().unwrap())];
        let session = Session::build(&policy, &pins, 4).unwrap();
        assert_eq!(session.generation(), 4);
        assert_eq!(session.policy().max_retries, 0);
    }
}
