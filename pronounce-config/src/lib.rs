//! Loader for service configuration with YAML + environment overlays.
//!
//! Every field is optional. Sources are merged in order: defaults, then an
//! optional YAML file, then `PRONOUNCE__`-prefixed environment variables
//! with `__` as the nesting separator (`PRONOUNCE__SERVER__PORT=9000`).
//! String values may reference other variables as `${VAR}`.
//!
//! ```yaml
//! server:
//!   host: 127.0.0.1
//!   port: 8771
//! dictionary:
//!   language: zh
//!   timeout_secs: 10
//!   max_retries: 3
//!   backoff_factor_ms: 1000
//! log:
//!   format: text
//!   stderr: false
//! ```
use config::{Config, Environment, File};
use pronounce_common::observability::LogFormat;
use pronounce_common::{APP_NAME, DEFAULT_HOST, DEFAULT_LANGUAGE, DEFAULT_PORT};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use config::ConfigError;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "PRONOUNCE";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct PronounceConfig {
    pub server: ServerConfig,
    pub dictionary: DictionaryConfig,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Upstream dictionary settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Subdomain used when a request has no `language` parameter.
    pub language: String,
    pub scheme: String,
    pub base_domain: String,
    /// Per-attempt request timeout.
    pub timeout_secs: u64,
    /// Status retries performed inside one session.
    pub max_retries: usize,
    pub backoff_factor_ms: u64,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            scheme: "https".to_string(),
            base_domain: "thefreedictionary.com".to_string(),
            timeout_secs: 10,
            max_retries: 3,
            backoff_factor_ms: 1000,
        }
    }
}

impl DictionaryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_factor(&self) -> Duration {
        Duration::from_millis(self.backoff_factor_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub format: LogFormat,
    /// Mirror events to stderr. Off by default; the flashcard host treats
    /// any stderr output as a failure.
    pub stderr: bool,
    /// Filter used when `RUST_LOG` is unset.
    pub filter: String,
    pub dir: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            stderr: false,
            filter: "info".to_string(),
            dir: None,
        }
    }
}

/// `<config_dir>/pronounce/pronounce.yaml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join(format!("{APP_NAME}.yaml")))
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder over the `config` crate sources.
pub struct PronounceConfigLoader {
    files: Vec<(PathBuf, bool)>,
    inline: Vec<String>,
}

impl Default for PronounceConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PronounceConfigLoader {
    /// Defaults plus `PRONOUNCE__` environment overrides.
    ///
    /// ```
    /// use pronounce_config::PronounceConfigLoader;
    ///
    /// let config = PronounceConfigLoader::new()
    ///     .with_yaml_str("server:\n  port: 9001")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.server.port, 9001);
    /// assert_eq!(config.dictionary.language, "zh");
    /// ```
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            inline: Vec::new(),
        }
    }

    /// Attach a file that must exist; the format is inferred from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), true));
        self
    }

    /// Attach a file that is skipped when missing.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), false));
        self
    }

    /// Merge an inline YAML snippet, after any files.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.inline.push(yaml.to_string());
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders and deserialize.
    ///
    /// ```
    /// use pronounce_config::PronounceConfigLoader;
    ///
    /// unsafe { std::env::set_var("TFD_LANG", "en"); }
    ///
    /// let config = PronounceConfigLoader::new()
    ///     .with_yaml_str("dictionary:\n  language: \"${TFD_LANG}\"")
    ///     .load()
    ///     .expect("valid configuration");
    /// assert_eq!(config.dictionary.language, "en");
    ///
    /// unsafe { std::env::remove_var("TFD_LANG"); }
    /// ```
    pub fn load(self) -> Result<PronounceConfig, ConfigError> {
        let mut builder = Config::builder();
        for (path, required) in &self.files {
            builder = builder.add_source(File::from(path.as_path()).required(*required));
        }
        for yaml in &self.inline {
            builder = builder.add_source(File::from_str(yaml, config::FileFormat::Yaml));
        }
        // Environment goes last so it wins over files.
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let mut v: Value = builder.build()?.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
