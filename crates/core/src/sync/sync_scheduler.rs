//! Fixed-period poll scheduler for sync cycles.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::quote_sync_model::SyncCycleTrigger;
use super::quote_sync_service::QuoteSyncService;
use super::sync_engine::SyncCycleResult;

/// Poll cadence in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

/// Shortest accepted period; tokio intervals cannot tick at zero.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

struct PollLoop {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Runs a sync cycle every `interval` until stopped.
///
/// Stopping prevents future cycles but lets an in-flight cycle finish.
pub struct PollScheduler {
    service: Arc<QuoteSyncService>,
    interval: Duration,
    background_task: Mutex<Option<PollLoop>>,
}

impl PollScheduler {
    pub fn new(service: Arc<QuoteSyncService>, interval: Duration) -> Self {
        Self {
            service,
            interval: interval.max(MIN_POLL_INTERVAL),
            background_task: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawns the poll loop. The first cycle runs one interval after start.
    /// Returns `false` when a loop is already running.
    pub async fn start(&self) -> bool {
        let mut guard = self.background_task.lock().await;
        if let Some(running) = guard.as_ref() {
            if !running.handle.is_finished() {
                return false;
            }
            guard.take();
        }

        let (shutdown, mut shutdown_rx) = watch::channel(false);
        let service = Arc::clone(&self.service);
        let period = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        let result = service.run_cycle(SyncCycleTrigger::Periodic).await;
                        debug!(
                            "[QuoteSync] Periodic cycle finished status={} duration_ms={}",
                            result.status, result.duration_ms
                        );
                    }
                }
            }
            info!("[QuoteSync] Poll loop exited");
        });

        info!(
            "[QuoteSync] Poll scheduler started interval_ms={}",
            period.as_millis()
        );
        *guard = Some(PollLoop { shutdown, handle });
        true
    }

    /// Signals the loop to exit and waits for it. An in-flight cycle completes
    /// before this returns.
    pub async fn stop(&self) {
        let running = self.background_task.lock().await.take();
        let Some(running) = running else {
            return;
        };
        // The loop may already have exited, leaving no receiver.
        let _ = running.shutdown.send(true);
        if let Err(err) = running.handle.await {
            warn!("[QuoteSync] Poll loop ended abnormally: {}", err);
        }
        info!("[QuoteSync] Poll scheduler stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.background_task
            .lock()
            .await
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Runs a cycle now. Serialized with periodic cycles by the service.
    pub async fn trigger_now(&self) -> SyncCycleResult {
        self.service.run_cycle(SyncCycleTrigger::Manual).await
    }
}
