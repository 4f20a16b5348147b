//! Outbound sync and cycle result types.

use log::{debug, warn};
use serde::Serialize;

use super::quote_sync_model::{RemoteQuoteSource, SyncCycleTrigger};
use crate::errors::Error;
use crate::quotes::Quote;

pub const CYCLE_STATUS_OK: &str = "ok";
pub const CYCLE_STATUS_FETCH_ERROR: &str = "fetch_error";
pub const CYCLE_STATUS_PUSH_PARTIAL: &str = "push_partial";
pub const CYCLE_STATUS_STORE_ERROR: &str = "store_error";

/// Result of submitting one quote to the remote.
#[derive(Debug)]
pub struct PushOutcome {
    pub quote: Quote,
    pub error: Option<Error>,
}

impl PushOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Submits each quote individually, in order. A failed record is logged and
/// recorded in its outcome; the remaining records are still submitted.
pub async fn push_quotes(remote: &dyn RemoteQuoteSource, quotes: &[Quote]) -> Vec<PushOutcome> {
    let mut outcomes = Vec::with_capacity(quotes.len());
    for quote in quotes {
        let error = match remote.push_quote(quote).await {
            Ok(()) => {
                debug!("[QuoteSync] Pushed quote: {}", quote.text);
                None
            }
            Err(err) => {
                warn!("[QuoteSync] Failed to push quote '{}': {}", quote.text, err);
                Some(err)
            }
        };
        outcomes.push(PushOutcome {
            quote: quote.clone(),
            error,
        });
    }
    outcomes
}

/// Summary of one fetch/reconcile/push cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncCycleResult {
    pub trigger: SyncCycleTrigger,
    pub status: String,
    pub fetched_count: usize,
    pub added: usize,
    pub updated: usize,
    pub conflicts: usize,
    pub pushed_count: usize,
    pub push_failed_count: usize,
    pub duration_ms: i64,
    pub error: Option<String>,
}

impl SyncCycleResult {
    pub(crate) fn new(trigger: SyncCycleTrigger) -> Self {
        Self {
            trigger,
            status: CYCLE_STATUS_OK.to_string(),
            fetched_count: 0,
            added: 0,
            updated: 0,
            conflicts: 0,
            pushed_count: 0,
            push_failed_count: 0,
            duration_ms: 0,
            error: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == CYCLE_STATUS_OK
    }
}
