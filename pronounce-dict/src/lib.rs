//! Pronunciation lookup against thefreedictionary.com pages.
//!
//! [`Dictionary`] trims the term, fetches `/<term>` from a [`PageSource`]
//! (normally [`pronounce_http::Fetcher`]) and pulls the audio URL out of the
//! page with [`extract`]. A page without a pronunciation gives an empty
//! [`LookupResult`], not an error.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use pronounce_dict::Dictionary;
//! use pronounce_http::Fetcher;
//!
//! let dict = Dictionary::new(Fetcher::new()?, "en");
//! let found = dict.lookup("cat").await?;
//! println!("{:?}", found.url);
//! # Ok(()) }
//! ```

use async_trait::async_trait;
use pronounce_http::{FetchError, Fetcher};
use serde::{Deserialize, Serialize};

pub mod extract;

pub use extract::ExtractionError;

/// Outcome of one lookup. Serializes to `{"url": "..."}` or `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl LookupResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn found(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.url.is_none()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
}

/// Anything that can hand back the HTML of a dictionary page.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, language: &str, path: &str) -> Result<String, FetchError>;
}

#[async_trait]
impl PageSource for Fetcher {
    async fn fetch_page(&self, language: &str, path: &str) -> Result<String, FetchError> {
        self.get(language, path).await
    }
}

pub struct Dictionary<S> {
    source: S,
    language: String,
}

impl<S: PageSource> Dictionary<S> {
    /// `language` is the subdomain used when a lookup carries no override.
    pub fn new(source: S, language: impl Into<String>) -> Self {
        Self {
            source,
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Look `term` up in the default language.
    pub async fn lookup(&self, term: &str) -> Result<LookupResult, LookupError> {
        self.lookup_in(term, None).await
    }

    /// Look `term` up, optionally on another language subdomain. A blank
    /// override falls back to the default language.
    pub async fn lookup_in(
        &self,
        term: &str,
        language: Option<&str>,
    ) -> Result<LookupResult, LookupError> {
        let term = term.trim();
        if term.is_empty() {
            tracing::debug!("lookup.blank_term");
            return Ok(LookupResult::empty());
        }
        let language = language
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(self.language.as_str());

        // NOTE: the term goes into the path unescaped; '?', '#' and '..'
        // reshape the upstream URL.
        let path = format!("/{term}");
        let html = self.source.fetch_page(language, &path).await?;

        match extract::extract_audio_url(&html)? {
            Some(url) => {
                tracing::info!(term, language, %url, "lookup.found");
                Ok(LookupResult::found(url))
            }
            None => {
                tracing::info!(term, language, html_len = html.len(), "lookup.not_found");
                Ok(LookupResult::empty())
            }
        }
    }
}
