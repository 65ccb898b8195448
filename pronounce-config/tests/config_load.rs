use pronounce_common::observability::LogFormat;
use pronounce_config::{PronounceConfig, PronounceConfigLoader};
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

#[test]
#[serial]
fn defaults_without_sources() {
    let config = PronounceConfigLoader::new().load().expect("load defaults");
    assert_eq!(config, PronounceConfig::default());
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8771);
    assert_eq!(config.dictionary.language, "zh");
    assert_eq!(config.dictionary.base_domain, "thefreedictionary.com");
    assert_eq!(config.dictionary.timeout_secs, 10);
    assert_eq!(config.dictionary.max_retries, 3);
    assert!(!config.log.stderr);
}

#[test]
#[serial]
fn file_overrides_defaults() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(
        &tmp,
        "pronounce.yaml",
        r#"
server:
  port: 9100
dictionary:
  language: en
  max_retries: 1
log:
  format: json
  stderr: true
"#,
    );

    let config = PronounceConfigLoader::new()
        .with_file(p)
        .load()
        .expect("load file config");

    assert_eq!(config.server.port, 9100);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.dictionary.language, "en");
    assert_eq!(config.dictionary.max_retries, 1);
    assert_eq!(config.dictionary.timeout_secs, 10);
    assert_eq!(config.log.format, LogFormat::Json);
    assert!(config.log.stderr);
}

#[test]
#[serial]
fn environment_wins_over_file() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(
        &tmp,
        "pronounce.yaml",
        "server:\n  port: 9100\ndictionary:\n  language: en\n",
    );

    temp_env::with_vars(
        [
            ("PRONOUNCE__SERVER__PORT", Some("9200")),
            ("PRONOUNCE__DICTIONARY__LANGUAGE", Some("de")),
        ],
        || {
            let config = PronounceConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load env config");
            assert_eq!(config.server.port, 9200);
            assert_eq!(config.dictionary.language, "de");
        },
    );
}

#[test]
#[serial]
fn missing_optional_file_is_skipped() {
    let tmp = TempDir::new().unwrap();
    let config = PronounceConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("optional file may be absent");
    assert_eq!(config.server.port, 8771);
}

#[test]
#[serial]
fn missing_required_file_fails() {
    let tmp = TempDir::new().unwrap();
    let err = PronounceConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(err.is_err());
}

#[test]
#[serial]
fn placeholders_expand_from_environment() {
    temp_env::with_var("PRONOUNCE_TEST_DOMAIN", Some("tfd.example"), || {
        let config = PronounceConfigLoader::new()
            .with_yaml_str("dictionary:\n  base_domain: \"${PRONOUNCE_TEST_DOMAIN}\"\n")
            .load()
            .expect("load with placeholder");
        assert_eq!(config.dictionary.base_domain, "tfd.example");
    });
}

#[test]
#[serial]
fn wrong_types_are_rejected() {
    let err = PronounceConfigLoader::new()
        .with_yaml_str("server:\n  port: not-a-port\n")
        .load();
    assert!(err.is_err());
}
