mod cli;
mod commands;
mod logging;
mod remote;
mod sink;

use std::sync::Arc;

use clap::Parser;
use cli::Cli;
use sink::ConsoleSink;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _logger = match logging::init_logging(&cli.log_level, cli.log_dir.as_deref()) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    };

    let sink = Arc::new(ConsoleSink::default());
    if let Err(err) = commands::run(cli, Arc::clone(&sink)).await {
        log::debug!("[QuoteSync] command failed: {err:#}");
        // The sink has already printed failures it was handed.
        if !sink.has_reported() {
            eprintln!("error: {err:#}");
        }
        std::process::exit(1);
    }
}
