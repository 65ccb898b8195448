//! # Audio source endpoint
//!
//! One route, `GET /`, answering the flashcard client's custom audio source
//! request:
//!
//! | Parameter | Meaning |
//! |-----------|---------|
//! | `term` | word to look up |
//! | `expression` | legacy name for `term`, used when `term` is absent or empty |
//! | `language` | dictionary subdomain for this request only |
//!
//! Other parameters (the client also sends `reading`) are ignored, and a
//! repeated parameter keeps its first value. The reply
//! is always `{"type": "audioSourceList", "audioSources": [...]}`; failures
//! come back as `502` with an empty list and an `error` string.

use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use pronounce_config::{DictionaryConfig, PronounceConfig};
use pronounce_dict::{Dictionary, LookupResult, PageSource};
use pronounce_http::{FetchError, Fetcher, RetryPolicy, Upstream};
use serde::Serialize;
use tokio::net::TcpListener;

const AUDIO_SOURCE_LIST: &str = "audioSourceList";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct AudioQuery {
    pub term: Option<String>,
    pub expression: Option<String>,
    pub language: Option<String>,
}

impl AudioQuery {
    /// Collect the known parameters from decoded query pairs; the first
    /// occurrence of a key wins.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "term" => &mut query.term,
                "expression" => &mut query.expression,
                "language" => &mut query.language,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }

    /// `term`, falling back to `expression` when `term` is missing or empty.
    pub fn resolved_term(&self) -> &str {
        self.term
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.expression.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct AudioSourceList {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "audioSources")]
    pub audio_sources: Vec<LookupResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AudioSourceList {
    pub fn single(result: LookupResult) -> Self {
        Self {
            kind: AUDIO_SOURCE_LIST,
            audio_sources: vec![result],
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            kind: AUDIO_SOURCE_LIST,
            audio_sources: Vec::new(),
            error: Some(message.into()),
        }
    }
}

/// Build the fetcher described by the dictionary section of the config.
pub fn build_fetcher(cfg: &DictionaryConfig) -> Result<Fetcher, FetchError> {
    Fetcher::builder()
        .upstream(Upstream {
            scheme: cfg.scheme.clone(),
            base_domain: cfg.base_domain.clone(),
        })
        .timeout(cfg.timeout())
        .retry_policy(
            RetryPolicy::default()
                .with_max_retries(cfg.max_retries)
                .with_backoff_factor(cfg.backoff_factor()),
        )
        .build()
}

pub fn router<S>(dict: Arc<Dictionary<S>>) -> Router
where
    S: PageSource + 'static,
{
    Router::new()
        .route("/", get(audio_sources::<S>))
        .with_state(dict)
}

async fn audio_sources<S>(
    State(dict): State<Arc<Dictionary<S>>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response
where
    S: PageSource + 'static,
{
    let query = AudioQuery::from_pairs(pairs);
    let term = query.resolved_term();
    tracing::debug!(term, language = ?query.language, "server.request");

    match dict.lookup_in(term, query.language.as_deref()).await {
        Ok(result) => (StatusCode::OK, Json(AudioSourceList::single(result))).into_response(),
        Err(err) => {
            tracing::warn!(term, language = ?query.language, error = %err, "server.lookup_failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(AudioSourceList::failure(err.to_string())),
            )
                .into_response()
        }
    }
}

/// Bind the configured address and serve until ctrl-c.
pub async fn serve(config: &PronounceConfig) -> anyhow::Result<()> {
    let fetcher = build_fetcher(&config.dictionary).context("failed to build HTTP client")?;
    let dict = Arc::new(Dictionary::new(fetcher, config.dictionary.language.clone()));

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| {
            format!(
                "failed to bind {}:{}",
                config.server.host, config.server.port
            )
        })?;
    tracing::info!(
        addr = %listener.local_addr()?,
        language = %config.dictionary.language,
        "server.listening"
    );

    axum::serve(listener, router(dict))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "server.signal_handler_failed");
        std::future::pending::<()>().await;
    }
    tracing::info!("server.shutdown");
}
