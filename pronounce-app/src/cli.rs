use std::path::PathBuf;

use clap::Parser;
use pronounce_config::{ConfigError, PronounceConfig, PronounceConfigLoader, default_config_path};

/// Local audio source serving thefreedictionary.com pronunciations.
#[derive(Debug, Parser)]
#[command(name = "pronounce", version)]
pub struct Cli {
    /// YAML config file. Defaults to `<config dir>/pronounce/pronounce.yaml` if present.
    #[arg(short, long, env = "PRONOUNCE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Interface to bind.
    #[arg(long)]
    pub host: Option<String>,

    #[arg(short, long)]
    pub port: Option<u16>,

    /// Default dictionary language (subdomain), e.g. `en`, `zh`, `de`.
    #[arg(short, long)]
    pub language: Option<String>,
}

impl Cli {
    /// Merge config sources and apply flag overrides on top.
    pub fn load_config(&self) -> Result<PronounceConfig, ConfigError> {
        let loader = PronounceConfigLoader::new();
        let loader = match (&self.config, default_config_path()) {
            (Some(explicit), _) => loader.with_file(explicit),
            (None, Some(fallback)) => loader.with_optional_file(fallback),
            (None, None) => loader,
        };
        let mut cfg = loader.load()?;
        self.apply(&mut cfg);
        Ok(cfg)
    }

    pub fn apply(&self, cfg: &mut PronounceConfig) {
        if let Some(host) = &self.host {
            cfg.server.host = host.clone();
        }
        if let Some(port) = self.port {
            cfg.server.port = port;
        }
        if let Some(language) = &self.language {
            cfg.dictionary.language = language.clone();
        }
    }
}
