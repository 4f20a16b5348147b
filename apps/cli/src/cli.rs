use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "quotesync")]
#[command(about = "Local quote store with remote sync", version)]
pub struct Cli {
    /// SQLite database holding the local quote store.
    #[arg(long, env = "QUOTESYNC_DB", default_value = "quotes.db", global = true)]
    pub db: PathBuf,

    /// Remote endpoint; overrides QUOTESYNC_API_URL.
    #[arg(long = "api-url", global = true)]
    pub api_url: Option<String>,

    /// Conflict policy: keep_local or prefer_remote.
    #[arg(long, global = true)]
    pub policy: Option<String>,

    #[arg(long = "log-level", env = "QUOTESYNC_LOG", default_value = "info", global = true)]
    pub log_level: String,

    /// Write rotating log files here instead of stderr.
    #[arg(long = "log-dir", env = "QUOTESYNC_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List quotes under the saved filter, or under `--category`.
    List {
        #[arg(long)]
        category: Option<String>,
    },
    Categories,
    /// Save the category filter (`all` clears it).
    Filter { category: String },
    Random,
    Add { text: String, category: String },
    Import { file: PathBuf },
    Export { file: PathBuf },
    /// Run one sync cycle and print its summary.
    Sync,
    /// Sync on startup, then poll until interrupted.
    Watch {
        /// Poll interval in seconds; overrides QUOTESYNC_POLL_INTERVAL_SECS.
        #[arg(long)]
        interval: Option<u64>,
    },
}

impl Command {
    /// Commands that talk to the remote endpoint.
    pub fn needs_remote(&self) -> bool {
        matches!(self, Self::Add { .. } | Self::Sync | Self::Watch { .. })
    }
}
