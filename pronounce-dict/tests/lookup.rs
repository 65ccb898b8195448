use std::time::Duration;

use pronounce_dict::{Dictionary, ExtractionError, LookupError, LookupResult};
use pronounce_http::{Fetcher, RetryPolicy, Upstream};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn dictionary_for(server: &MockServer, language: &str) -> Dictionary<Fetcher> {
    let upstream = Upstream {
        scheme: "http".into(),
        base_domain: "tfd.test".into(),
    };
    let mut builder = Fetcher::builder()
        .timeout(Duration::from_secs(5))
        .retry_policy(RetryPolicy::default().with_backoff_factor(Duration::ZERO));
    for lang in ["en", "zh", "de"] {
        builder = builder.resolve(upstream.host_for(lang), *server.address());
    }
    let fetcher = builder.upstream(upstream).build().expect("fetcher builds");
    Dictionary::new(fetcher, language)
}

#[tokio::test]
async fn looks_up_word_through_fetcher() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/%E7%8C%AB"))
        .and(header("host", "zh.tfd.test"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><span class="snd2" data-snd="17a2b9"></span></body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let dict = dictionary_for(&server, "zh").await;
    let got = dict.lookup("猫").await.unwrap();
    assert_eq!(
        got,
        LookupResult::found("https://img2.tfd.com/pron/mp3/17a2b9.mp3")
    );
}

#[tokio::test]
async fn not_found_page_degrades_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<h1>Word not found</h1>"))
        .mount(&server)
        .await;

    let dict = dictionary_for(&server, "en").await;
    assert!(dict.lookup("qwzx").await.unwrap().is_empty());
}

#[tokio::test]
async fn exhausted_server_errors_degrade_to_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(4)
        .mount(&server)
        .await;

    let dict = dictionary_for(&server, "en").await;
    assert!(dict.lookup("cat").await.unwrap().is_empty());
}

#[tokio::test]
async fn changed_markup_without_attribute_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<span class="snd2" data-src="x"></span>"#),
        )
        .mount(&server)
        .await;

    let dict = dictionary_for(&server, "en").await;
    let err = dict.lookup("cat").await.unwrap_err();
    assert!(
        matches!(
            err,
            LookupError::Extraction(ExtractionError::MissingAttribute { .. })
        ),
        "{err:?}"
    );
}

#[tokio::test]
async fn language_override_picks_subdomain() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Haus"))
        .and(header("host", "de.tfd.test"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"<span class="snd2" data-snd="de/Haus"></span>"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dict = dictionary_for(&server, "zh").await;
    let got = dict.lookup_in("Haus", Some("de")).await.unwrap();
    assert_eq!(
        got.url.as_deref(),
        Some("https://img2.tfd.com/pron/mp3/de/Haus.mp3")
    );
}
