//! Orchestrates fetch, reconcile, persist and push over one local store.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::sync::Mutex;

use super::quote_sync_model::{
    reconcile, ConflictPolicy, RemoteQuoteSource, SyncCycleTrigger, SyncEngineStatus,
};
use super::sync_engine::{
    push_quotes, SyncCycleResult, CYCLE_STATUS_FETCH_ERROR, CYCLE_STATUS_PUSH_PARTIAL,
    CYCLE_STATUS_STORE_ERROR,
};
use crate::errors::{Error, Result};
use crate::events::{Notification, NotificationSink};
use crate::quotes::{CategoryFilter, LocalStore, Quote};

/// Result of a direct add. The local add always stands; the push may fail.
#[derive(Debug)]
pub struct AddQuoteOutcome {
    pub quote: Quote,
    pub push_error: Option<Error>,
}

impl AddQuoteOutcome {
    pub fn pushed(&self) -> bool {
        self.push_error.is_none()
    }
}

/// Sole owner of the local store during sync.
///
/// The cycle mutex serializes sync cycles, direct adds and imports, so the
/// store never sees interleaved read-modify-write sequences. Merges are
/// computed off-store and applied in one write, so readers only observe
/// persisted snapshots.
pub struct QuoteSyncService {
    store: Mutex<LocalStore>,
    remote: Arc<dyn RemoteQuoteSource>,
    sink: Arc<dyn NotificationSink>,
    policy: ConflictPolicy,
    cycle_mutex: Mutex<()>,
    status: Mutex<SyncEngineStatus>,
}

impl QuoteSyncService {
    pub fn new(
        store: LocalStore,
        remote: Arc<dyn RemoteQuoteSource>,
        sink: Arc<dyn NotificationSink>,
        policy: ConflictPolicy,
    ) -> Self {
        Self {
            store: Mutex::new(store),
            remote,
            sink,
            policy,
            cycle_mutex: Mutex::new(()),
            status: Mutex::new(SyncEngineStatus::default()),
        }
    }

    /// Runs one fetch → reconcile → persist → push cycle.
    ///
    /// Never returns an error: failures are logged, reported and summarized in
    /// the result. A failed fetch skips reconciliation and leaves the store
    /// untouched; the push stage still runs.
    pub async fn run_cycle(&self, trigger: SyncCycleTrigger) -> SyncCycleResult {
        let _cycle_guard = self.cycle_mutex.lock().await;
        let started_at = Instant::now();
        let mut result = SyncCycleResult::new(trigger);
        let mut pulled_at = None;
        let mut pushed_at = None;

        match self.remote.fetch_quotes().await {
            Ok(remote_quotes) => {
                pulled_at = Some(Utc::now().to_rfc3339());
                result.fetched_count = remote_quotes.len();
                match self.apply_remote(&remote_quotes, &mut result).await {
                    Ok(notifications) => {
                        for notification in &notifications {
                            self.sink.notify(notification);
                        }
                    }
                    Err(err) => {
                        result.status = CYCLE_STATUS_STORE_ERROR.to_string();
                        result.error = Some(err.to_string());
                        self.report(trigger, "Persisting merged quotes", &err);
                    }
                }
            }
            Err(err) => {
                result.status = CYCLE_STATUS_FETCH_ERROR.to_string();
                result.error = Some(err.to_string());
                self.report(trigger, "Fetching remote quotes", &err);
            }
        }

        let local = self.store.lock().await.snapshot();
        if !local.is_empty() {
            let outcomes = push_quotes(self.remote.as_ref(), &local).await;
            let failed = outcomes.iter().filter(|o| !o.is_success()).count();
            result.pushed_count = outcomes.len() - failed;
            result.push_failed_count = failed;
            pushed_at = Some(Utc::now().to_rfc3339());

            if failed > 0 && result.is_ok() {
                result.status = CYCLE_STATUS_PUSH_PARTIAL.to_string();
                result.error = Some(format!(
                    "{} of {} quotes failed to push",
                    failed,
                    outcomes.len()
                ));
            }
        }

        result.duration_ms = started_at.elapsed().as_millis() as i64;
        self.record_cycle(&result, pulled_at, pushed_at).await;

        info!(
            "[QuoteSync] Cycle complete trigger={:?} status={} fetched={} added={} updated={} conflicts={} pushed={} push_failed={} duration_ms={}",
            result.trigger,
            result.status,
            result.fetched_count,
            result.added,
            result.updated,
            result.conflicts,
            result.pushed_count,
            result.push_failed_count,
            result.duration_ms
        );
        result
    }

    /// Validates and appends a quote, then pushes just that record.
    pub async fn add_quote(&self, text: &str, category: &str) -> Result<AddQuoteOutcome> {
        let quote = Quote::new(text, category)?;
        let _cycle_guard = self.cycle_mutex.lock().await;

        if let Err(err) = self.store.lock().await.add(quote.clone()) {
            self.sink.report_failure("Adding quote", &err);
            return Err(err);
        }
        debug!("[QuoteSync] Added local quote: {}", quote.text);

        let push_error = match self.remote.push_quote(&quote).await {
            Ok(()) => {
                self.status.lock().await.last_push_at = Some(Utc::now().to_rfc3339());
                None
            }
            Err(err) => {
                warn!("[QuoteSync] Failed to push new quote '{}': {}", quote.text, err);
                self.sink.report_failure("Pushing new quote", &err);
                Some(err)
            }
        };

        Ok(AddQuoteOutcome { quote, push_error })
    }

    /// Appends every record of a JSON array without merging.
    pub async fn import_quotes(&self, raw_json: &str) -> Result<usize> {
        let _cycle_guard = self.cycle_mutex.lock().await;
        let imported = self.store.lock().await.import_json(raw_json);
        match imported {
            Ok(count) => {
                info!("[QuoteSync] Imported {} quotes", count);
                Ok(count)
            }
            Err(err) => {
                self.sink.report_failure("Importing quotes", &err);
                Err(err)
            }
        }
    }

    pub async fn export_quotes(&self) -> Result<String> {
        self.store.lock().await.export_json()
    }

    pub async fn snapshot(&self) -> Vec<Quote> {
        self.store.lock().await.snapshot()
    }

    pub async fn categories(&self) -> BTreeSet<String> {
        self.store.lock().await.categories()
    }

    pub async fn selected_filter(&self) -> Result<CategoryFilter> {
        self.store.lock().await.selected_filter()
    }

    pub async fn set_filter(&self, filter: &CategoryFilter) -> Result<()> {
        self.store.lock().await.set_filter(filter)
    }

    pub async fn filtered(&self, filter: &CategoryFilter) -> Vec<Quote> {
        self.store.lock().await.filtered(filter)
    }

    /// Quotes matching the persisted filter.
    pub async fn visible_quotes(&self) -> Result<Vec<Quote>> {
        let store = self.store.lock().await;
        let filter = store.selected_filter()?;
        Ok(store.filtered(&filter))
    }

    /// Picks a random quote under the persisted filter and records it as viewed.
    pub async fn show_random_quote(&self) -> Result<Option<Quote>> {
        let store = self.store.lock().await;
        let filter = store.selected_filter()?;
        let picked = store.random_quote(&filter, &mut rand::thread_rng());
        if let Some(quote) = &picked {
            store.record_viewed(quote)?;
        }
        Ok(picked)
    }

    pub async fn record_viewed(&self, quote: &Quote) -> Result<()> {
        self.store.lock().await.record_viewed(quote)
    }

    pub async fn last_viewed(&self) -> Result<Option<Quote>> {
        self.store.lock().await.last_viewed()
    }

    pub async fn status(&self) -> SyncEngineStatus {
        self.status.lock().await.clone()
    }

    async fn apply_remote(
        &self,
        remote_quotes: &[Quote],
        result: &mut SyncCycleResult,
    ) -> Result<Vec<Notification>> {
        let mut store = self.store.lock().await;
        let outcome = reconcile(store.snapshot(), remote_quotes, self.policy);
        let (added, updated, conflicts) =
            (outcome.added(), outcome.updated(), outcome.conflicts());

        if outcome.changed() {
            store.replace_all(outcome.merged)?;
        }
        // Counts only describe merges that reached storage.
        result.added = added;
        result.updated = updated;
        result.conflicts = conflicts;
        Ok(outcome.notifications)
    }

    async fn record_cycle(
        &self,
        result: &SyncCycleResult,
        pulled_at: Option<String>,
        pushed_at: Option<String>,
    ) {
        let mut status = self.status.lock().await;
        if pulled_at.is_some() {
            status.last_pull_at = pulled_at;
        }
        if pushed_at.is_some() {
            status.last_push_at = pushed_at;
        }
        status.last_error = result.error.clone();
        status.last_cycle_status = Some(result.status.clone());
        status.last_cycle_duration_ms = Some(result.duration_ms);
    }

    /// Periodic failures only reach the log; user-initiated ones are surfaced.
    fn report(&self, trigger: SyncCycleTrigger, context: &str, err: &Error) {
        match trigger {
            SyncCycleTrigger::Periodic => {
                warn!("[QuoteSync] {} failed: {}", context, err);
            }
            _ => self.sink.report_failure(context, err),
        }
    }
}
