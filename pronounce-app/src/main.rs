use anyhow::Result;
use clap::Parser;
use pronounce_app::cli::Cli;
use pronounce_app::server;
use pronounce_common::APP_NAME;
use pronounce_common::observability::{LogConfig, init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (file < env < flags)
    let cfg = cli.load_config()?;

    // 2) Logging before anything touches the network
    let log_path = init_logging(LogConfig {
        app_name: APP_NAME,
        log_dir: cfg.log.dir.clone(),
        emit_stderr: cfg.log.stderr,
        format: cfg.log.format,
        default_filter: cfg.log.filter.clone(),
    })?;
    tracing::info!(
        log_file = %log_path.display(),
        host = %cfg.server.host,
        port = cfg.server.port,
        language = %cfg.dictionary.language,
        "pronounce.start"
    );

    server::serve(&cfg).await
}
