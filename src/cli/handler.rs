use super::error;
use super::output;
use super::{Commands, ConfigAction, HistoryAction};
use crate::app::config::Config;
use crate::download::{DownloadSession, ProgressEvent, SessionError};
use anyhow::Result;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Handle a CLI command and return exit code
pub async fn handle_command(command: Commands, config: Config, session: DownloadSession) -> i32 {
    let tick = Duration::from_millis(config.ui.tick_ms.max(10));
    let mut session = session;

    let result = match command {
        Commands::Formats { url, json } => handle_formats(&mut session, &url, json, tick).await,
        Commands::Download { url, format, dir } => {
            handle_download(&mut session, &url, &format, dir, tick).await
        }
        Commands::Grab { url, dir } => handle_grab(&mut session, &url, dir, tick).await,
        Commands::History { json, action } => handle_history(&mut session, json, action),
        Commands::Config { action } => handle_config(config, action),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            error::ERROR
        }
    }
}

/// Discover and print the catalog
async fn handle_formats(
    session: &mut DownloadSession,
    url: &str,
    json: bool,
    tick: Duration,
) -> Result<i32> {
    if let Err(e) = session.fetch(url) {
        return Ok(rejected(e));
    }

    match drain_until_terminal(session, tick).await? {
        Some(ProgressEvent::CatalogReady(catalog)) => {
            println!("{}", output::format_catalog(&catalog, json));
            Ok(error::SUCCESS)
        }
        other => Ok(report_unexpected(other)),
    }
}

/// Discover, then download the chosen entry
async fn handle_download(
    session: &mut DownloadSession,
    url: &str,
    format_id: &str,
    dir: Option<PathBuf>,
    tick: Duration,
) -> Result<i32> {
    if let Some(dir) = dir {
        session.set_download_dir(dir);
    }
    if let Err(e) = session.fetch(url) {
        return Ok(rejected(e));
    }

    match drain_until_terminal(session, tick).await? {
        Some(ProgressEvent::CatalogReady(catalog)) => {
            println!("{}", catalog.source.title_display(output::TITLE_WIDTH));
            println!("{}", catalog.source.duration_display());
        }
        other => return Ok(report_unexpected(other)),
    }

    if let Err(e) = session.download(format_id) {
        return Ok(rejected(e));
    }
    finish_download(session, tick).await
}

/// Download the best single-file format directly
async fn handle_grab(
    session: &mut DownloadSession,
    url: &str,
    dir: Option<PathBuf>,
    tick: Duration,
) -> Result<i32> {
    if let Some(dir) = dir {
        session.set_download_dir(dir);
    }
    if let Err(e) = session.download_best(url) {
        return Ok(rejected(e));
    }
    finish_download(session, tick).await
}

async fn finish_download(session: &mut DownloadSession, tick: Duration) -> Result<i32> {
    println!("Downloading to {:?}", session.download_dir());

    match drain_until_terminal(session, tick).await? {
        Some(ProgressEvent::DownloadFinished { path, record }) => {
            println!("\nDownload complete: {}", record.title);
            println!("Saved to {:?}", path);
            Ok(error::SUCCESS)
        }
        other => Ok(report_unexpected(other)),
    }
}

/// Polls the session on every tick, rendering progress, until the worker's
/// terminal event arrives. Ctrl+C supersedes the worker and yields `None`.
async fn drain_until_terminal(
    session: &mut DownloadSession,
    tick: Duration,
) -> Result<Option<ProgressEvent>> {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                for event in session.poll() {
                    match event {
                        ProgressEvent::DownloadProgress { fraction, speed } => {
                            print!("\r{}   ", output::format_progress(fraction, speed));
                            io::stdout().flush()?;
                        }
                        ProgressEvent::Busy => {}
                        terminal => return Ok(Some(terminal)),
                    }
                }
            }
            result = &mut ctrl_c => {
                result?;
                tracing::info!("Interrupted, abandoning generation {}", session.generation());
                session.reset();
                return Ok(None);
            }
        }
    }
}

fn rejected(e: SessionError) -> i32 {
    eprintln!("Error: {}", e);
    error::exit_code(&e)
}

fn report_unexpected(event: Option<ProgressEvent>) -> i32 {
    match event {
        Some(ProgressEvent::Failed { message, .. }) => {
            eprintln!("\nError: {}", message);
            error::ERROR
        }
        None => {
            eprintln!("\nInterrupted");
            error::ERROR
        }
        Some(other) => {
            tracing::warn!("Unexpected event: {:?}", other);
            eprintln!("\nError: unexpected event");
            error::ERROR
        }
    }
}

fn handle_history(
    session: &mut DownloadSession,
    json: bool,
    action: Option<HistoryAction>,
) -> Result<i32> {
    match action {
        Some(HistoryAction::Clear) => {
            let count = session.history().len();
            session.clear_history()?;
            println!("Cleared {} history entries", count);
        }
        None => {
            let entries = session.history().newest_first();
            println!("{}", output::format_history(&entries, json));
        }
    }
    Ok(error::SUCCESS)
}

fn handle_config(mut config: Config, action: ConfigAction) -> Result<i32> {
    match action {
        ConfigAction::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
        ConfigAction::SetDir { path } => {
            if path.as_os_str().is_empty() {
                eprintln!("Error: directory must not be empty");
                return Ok(error::INVALID_INPUT);
            }
            config.download.directory = path;
            config.save()?;
            println!("Download directory set to {:?}", config.download.directory);
        }
    }
    Ok(error::SUCCESS)
}
