use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod error;
pub mod handler;
pub mod output;

/// mediagrab - fetch media formats and download them with yt-dlp
#[derive(Parser, Debug)]
#[command(name = "mediagrab")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Override config directory path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (TRACE level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the downloadable formats of a URL
    Formats {
        /// Media page URL
        url: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Discover formats, then download one of them
    Download {
        /// Media page URL
        url: String,

        /// Format ID from `formats`
        #[arg(long, short)]
        format: String,

        /// Download directory (default: configured directory)
        #[arg(long, value_name = "PATH")]
        dir: Option<PathBuf>,
    },

    /// Download the best single-file format without listing formats
    Grab {
        /// Media page URL
        url: String,

        /// Download directory (default: configured directory)
        #[arg(long, value_name = "PATH")]
        dir: Option<PathBuf>,
    },

    /// Show download history, newest first
    History {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        #[command(subcommand)]
        action: Option<HistoryAction>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// History actions
#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// Remove every history entry
    Clear,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show all configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Persist the default download directory
    SetDir {
        path: PathBuf,
    },
}
