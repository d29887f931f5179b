use anyhow::Result;
use clap::Parser;
use mediagrab::{
    app::config::Config,
    cli::{self, Cli},
    download::{DownloadSession, HistoryStore, SessionOptions},
    extractor::ytdlp::YtDlp,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first to get verbose flag and config override
    let cli = Cli::parse();

    if let Some(ref config_dir) = cli.config {
        mediagrab::util::paths::set_config_dir_override(Some(config_dir.clone()));
    }

    // Get logs directory (creates if needed)
    let logs_dir = mediagrab::util::paths::get_logs_dir().unwrap_or_else(|_| PathBuf::from("."));
    std::fs::create_dir_all(&logs_dir).ok();

    // Daily rotating JSON log file
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "app.jsonl");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let log_level = if cli.verbose {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_filter(tracing_subscriber::filter::LevelFilter::from_level(log_level)),
        )
        .init();

    tracing::info!("Starting mediagrab...");
    if let Some(ref config_dir) = cli.config {
        tracing::info!("Using config directory override: {:?}", config_dir);
    }
    tracing::trace!("CLI arguments: {:?}", cli);

    let config = Config::load()?;
    tracing::info!("Config loaded: {:?}", config);

    let extractor = YtDlp::new(config.extractor.program.clone())
        .with_extra_args(config.extractor.extra_args.clone());
    let history = HistoryStore::open(config.history_path()?, config.history.on_duplicate);
    let session = DownloadSession::new(
        Arc::new(extractor),
        config.catalog_builder(),
        history,
        SessionOptions::from_config(&config),
    );

    let exit_code = cli::handler::handle_command(cli.command, config, session).await;

    // Flush buffered log lines before exiting
    drop(_guard);
    std::process::exit(exit_code);
}
