//! Command handlers. Each one runs against a service opened over the
//! SQLite-backed store.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use quotesync_core::{
    CategoryFilter, ConflictPolicy, LocalStore, MemoryStorage, NotificationSink, PollScheduler,
    QuoteSyncService, RemoteQuoteSource, Storage, SyncConfig, SyncCycleTrigger,
};
use quotesync_storage_sqlite::SqliteStorage;

use crate::cli::{Cli, Command};
use crate::remote::LazyRemote;
use crate::sink::ConsoleSink;

/// Resolves env configuration, then applies command-line overrides.
pub fn resolve_config(cli: &Cli) -> Result<SyncConfig> {
    let mut config = SyncConfig::from_env().context("invalid environment configuration")?;
    if let Some(url) = cli.api_url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        config.remote_endpoint = url.trim_end_matches('/').to_string();
    }
    if let Some(policy) = cli.policy.as_deref() {
        config.conflict_policy = policy.parse::<ConflictPolicy>()?;
    }
    if let Command::Watch {
        interval: Some(secs),
    } = cli.cmd
    {
        anyhow::ensure!(secs > 0, "poll interval must be at least one second");
        config.poll_interval = Duration::from_secs(secs);
    }
    Ok(config)
}

pub fn open_service(
    db_path: &Path,
    remote: Arc<dyn RemoteQuoteSource>,
    sink: Arc<dyn NotificationSink>,
    policy: ConflictPolicy,
) -> Result<Arc<QuoteSyncService>> {
    let storage: Arc<dyn Storage> = Arc::new(
        SqliteStorage::open(db_path)
            .with_context(|| format!("failed to open database `{}`", db_path.display()))?,
    );
    let store = LocalStore::open(storage, Arc::new(MemoryStorage::new()))?;
    Ok(Arc::new(QuoteSyncService::new(store, remote, sink, policy)))
}

pub async fn run(cli: Cli, sink: Arc<ConsoleSink>) -> Result<()> {
    let config = resolve_config(&cli)?;
    info!(
        "[QuoteSync] policy={} db={}",
        config.conflict_policy,
        cli.db.display()
    );
    let remote = Arc::new(LazyRemote::new(config.clone()));
    if cli.cmd.needs_remote() {
        remote.client()?;
    }
    let service = open_service(&cli.db, remote, sink, config.conflict_policy)?;

    match cli.cmd {
        Command::List { category } => {
            let quotes = match category {
                Some(raw) => service.filtered(&raw.parse::<CategoryFilter>()?).await,
                None => service.visible_quotes().await?,
            };
            if quotes.is_empty() {
                println!("No quotes.");
            }
            for quote in quotes {
                println!("\"{}\" [{}]", quote.text, quote.category);
            }
        }
        Command::Categories => {
            for category in service.categories().await {
                println!("{category}");
            }
        }
        Command::Filter { category } => {
            let filter = category.parse::<CategoryFilter>()?;
            service.set_filter(&filter).await?;
            println!("Filter set to {filter}");
        }
        Command::Random => match service.show_random_quote().await? {
            Some(quote) => println!("\"{}\" [{}]", quote.text, quote.category),
            None => println!("No quotes available."),
        },
        Command::Add { text, category } => {
            let outcome = service.add_quote(&text, &category).await?;
            if outcome.pushed() {
                println!("Quote added and synced.");
            } else {
                println!("Quote added locally; remote sync failed.");
            }
        }
        Command::Import { file } => {
            let count = import_file(&service, &file).await?;
            println!("Imported {count} quotes.");
        }
        Command::Export { file } => {
            export_file(&service, &file).await?;
            println!("Exported quotes to {}", file.display());
        }
        Command::Sync => {
            let result = service.run_cycle(SyncCycleTrigger::Manual).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Watch { .. } => watch(service, config.poll_interval).await?,
    }
    Ok(())
}

pub async fn import_file(service: &QuoteSyncService, file: &Path) -> Result<usize> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read `{}`", file.display()))?;
    Ok(service.import_quotes(&raw).await?)
}

pub async fn export_file(service: &QuoteSyncService, file: &Path) -> Result<()> {
    let json = service.export_quotes().await?;
    std::fs::write(file, json).with_context(|| format!("failed to write `{}`", file.display()))
}

async fn watch(service: Arc<QuoteSyncService>, interval: Duration) -> Result<()> {
    service.run_cycle(SyncCycleTrigger::Startup).await;

    let scheduler = PollScheduler::new(Arc::clone(&service), interval);
    scheduler.start().await;
    println!(
        "Polling every {}s; press Ctrl-C to stop.",
        scheduler.interval().as_secs()
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    scheduler.stop().await;

    let status = service.status().await;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
