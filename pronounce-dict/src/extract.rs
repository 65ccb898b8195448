//! Pronunciation extraction from dictionary page markup.
//!
//! The page marks its audio button as `<span class="snd2" data-snd="TOKEN">`.
//! Only the first such span counts. A page without one is a normal miss; a
//! span without `data-snd` means the page changed shape underneath us and is
//! reported as an error.

use scraper::{Html, Selector};

/// Prefix of every produced audio URL.
pub const AUDIO_BASE_URL: &str = "https://img2.tfd.com/pron/mp3/";

const PRONUNCIATION_SELECTOR: &str = "span.snd2";
const SOUND_ATTRIBUTE: &str = "data-snd";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("invalid selector `{selector}`: {message}")]
    Selector {
        selector: &'static str,
        message: String,
    },
    #[error("pronunciation element has no `{attribute}` attribute")]
    MissingAttribute { attribute: &'static str },
}

/// Build the audio URL for a `data-snd` token, verbatim.
///
/// ```
/// use pronounce_dict::extract::audio_url;
///
/// assert_eq!(audio_url("abc123"), "https://img2.tfd.com/pron/mp3/abc123.mp3");
/// assert_eq!(audio_url("a b"), "https://img2.tfd.com/pron/mp3/a b.mp3");
/// ```
pub fn audio_url(token: &str) -> String {
    format!("{AUDIO_BASE_URL}{token}.mp3")
}

/// Raw `data-snd` value of the first pronunciation span, if the page has one.
pub fn find_sound_token(html: &str) -> Result<Option<String>, ExtractionError> {
    let selector =
        Selector::parse(PRONUNCIATION_SELECTOR).map_err(|e| ExtractionError::Selector {
            selector: PRONUNCIATION_SELECTOR,
            message: e.to_string(),
        })?;
    let doc = Html::parse_document(html);

    let Some(element) = doc.select(&selector).next() else {
        return Ok(None);
    };

    element
        .value()
        .attr(SOUND_ATTRIBUTE)
        .map(|token| Some(token.to_string()))
        .ok_or(ExtractionError::MissingAttribute {
            attribute: SOUND_ATTRIBUTE,
        })
}

/// Audio URL for the page's pronunciation, or `None` when it has none.
pub fn extract_audio_url(html: &str) -> Result<Option<String>, ExtractionError> {
    Ok(find_sound_token(html)?.map(|token| audio_url(&token)))
}
