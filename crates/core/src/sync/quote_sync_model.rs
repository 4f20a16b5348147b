//! Quote sync domain models, the remote source contract, and the merge rule.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::events::Notification;
use crate::quotes::Quote;

/// How to resolve a remote record whose text matches a local record with a
/// different category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Keep the local record unchanged and emit `Conflict`.
    #[default]
    KeepLocal,
    /// Overwrite with the remote record and emit `Updated`.
    PreferRemote,
}

impl ConflictPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeepLocal => "keep_local",
            Self::PreferRemote => "prefer_remote",
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keep_local" | "keep-local" | "local" => Ok(Self::KeepLocal),
            "prefer_remote" | "prefer-remote" | "remote" => Ok(Self::PreferRemote),
            other => Err(Error::config(format!(
                "unsupported conflict policy '{other}'; expected keep_local|prefer_remote"
            ))),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trigger source for sync cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncCycleTrigger {
    Startup,
    Periodic,
    Manual,
}

/// In-memory summary of the most recent sync activity. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEngineStatus {
    pub last_pull_at: Option<String>,
    pub last_push_at: Option<String>,
    pub last_error: Option<String>,
    pub last_cycle_status: Option<String>,
    pub last_cycle_duration_ms: Option<i64>,
}

/// Remote source of truth for quotes.
///
/// Implementations map their wire shape into [`Quote`] and classify failures
/// as [`Error::Transport`] or [`Error::Parse`].
#[async_trait]
pub trait RemoteQuoteSource: Send + Sync {
    async fn fetch_quotes(&self) -> Result<Vec<Quote>>;

    async fn push_quote(&self, quote: &Quote) -> Result<()>;
}

/// Merged snapshot plus the notifications produced while merging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub merged: Vec<Quote>,
    pub notifications: Vec<Notification>,
    changed: bool,
}

impl ReconcileOutcome {
    /// Whether `merged` differs from the local input.
    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn added(&self) -> usize {
        self.count(|n| matches!(n, Notification::Added(_)))
    }

    pub fn updated(&self) -> usize {
        self.count(|n| matches!(n, Notification::Updated(_)))
    }

    pub fn conflicts(&self) -> usize {
        self.count(|n| matches!(n, Notification::Conflict(_)))
    }

    fn count(&self, pred: impl Fn(&Notification) -> bool) -> usize {
        self.notifications.iter().filter(|n| pred(n)).count()
    }
}

/// Merges a remote snapshot into the local one.
///
/// Rule, for each remote record in order, matching on exact `text` against
/// local records and records merged earlier in the same pass:
/// 1. no match: append, emit `Added`
/// 2. match with equal category: replace in place, emit `Updated`
/// 3. match with different category: apply `policy`
pub fn reconcile(local: Vec<Quote>, remote: &[Quote], policy: ConflictPolicy) -> ReconcileOutcome {
    let original = local.clone();
    let mut merged = local;
    let mut index: HashMap<String, usize> = HashMap::with_capacity(merged.len() + remote.len());
    for (position, quote) in merged.iter().enumerate() {
        // First occurrence wins when the local snapshot already holds duplicates.
        index.entry(quote.text.clone()).or_insert(position);
    }

    let mut notifications = Vec::with_capacity(remote.len());

    for incoming in remote {
        match index.get(&incoming.text).copied() {
            None => {
                index.insert(incoming.text.clone(), merged.len());
                merged.push(incoming.clone());
                notifications.push(Notification::Added(incoming.text.clone()));
            }
            Some(position) => {
                let existing = &mut merged[position];
                if existing.category == incoming.category {
                    notifications.push(Notification::Updated(incoming.text.clone()));
                    continue;
                }
                match policy {
                    ConflictPolicy::KeepLocal => {
                        notifications.push(Notification::Conflict(incoming.text.clone()));
                    }
                    ConflictPolicy::PreferRemote => {
                        existing.category = incoming.category.clone();
                        notifications.push(Notification::Updated(incoming.text.clone()));
                    }
                }
            }
        }
    }

    // Category flips within one snapshot can cancel out.
    let changed = merged != original;
    ReconcileOutcome {
        merged,
        notifications,
        changed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn q(text: &str, category: &str) -> Quote {
        Quote::new(text, category).expect("valid quote")
    }

    #[test]
    fn new_remote_record_is_appended() {
        let outcome = reconcile(vec![q("A", "X")], &[q("B", "General")], ConflictPolicy::KeepLocal);
        assert_eq!(outcome.merged, vec![q("A", "X"), q("B", "General")]);
        assert_eq!(outcome.notifications, vec![Notification::Added("B".into())]);
        assert!(outcome.changed());
    }

    #[test]
    fn matching_record_with_same_category_is_updated() {
        let local = vec![q("Keep going", "Motivation")];
        let remote = vec![q("Keep going", "Motivation"), q("New one", "General")];
        let outcome = reconcile(local, &remote, ConflictPolicy::KeepLocal);

        assert_eq!(outcome.merged, remote);
        assert_eq!(outcome.updated(), 1);
        assert_eq!(outcome.added(), 1);
        assert_eq!(outcome.conflicts(), 0);
    }

    #[test]
    fn keep_local_policy_preserves_local_category() {
        let outcome = reconcile(vec![q("A", "X")], &[q("A", "Y")], ConflictPolicy::KeepLocal);
        assert_eq!(outcome.merged, vec![q("A", "X")]);
        assert_eq!(outcome.notifications, vec![Notification::Conflict("A".into())]);
        assert!(!outcome.changed());
    }

    #[test]
    fn prefer_remote_policy_overwrites() {
        let outcome = reconcile(vec![q("A", "X")], &[q("A", "Y")], ConflictPolicy::PreferRemote);
        assert_eq!(outcome.merged, vec![q("A", "Y")]);
        assert_eq!(outcome.notifications, vec![Notification::Updated("A".into())]);
        assert!(outcome.changed());
    }

    #[test]
    fn conflict_resolution_is_deterministic() {
        for policy in [ConflictPolicy::KeepLocal, ConflictPolicy::PreferRemote] {
            let first = reconcile(vec![q("A", "X")], &[q("A", "Y")], policy);
            for _ in 0..5 {
                assert_eq!(reconcile(vec![q("A", "X")], &[q("A", "Y")], policy), first);
            }
        }
    }

    #[test]
    fn reconciling_same_snapshot_twice_is_idempotent() {
        let remote = vec![q("A", "General"), q("B", "General")];
        let first = reconcile(vec![q("C", "X")], &remote, ConflictPolicy::KeepLocal);
        let second = reconcile(first.merged.clone(), &remote, ConflictPolicy::KeepLocal);

        assert_eq!(second.merged, first.merged);
        assert!(!second.changed());
        assert_eq!(second.added(), 0);
        assert_eq!(second.updated(), remote.len());
    }

    #[test]
    fn duplicate_texts_within_one_remote_snapshot_merge_into_one_entry() {
        let remote = vec![q("A", "General"), q("A", "General"), q("A", "Other")];
        let outcome = reconcile(Vec::new(), &remote, ConflictPolicy::PreferRemote);
        assert_eq!(outcome.merged, vec![q("A", "Other")]);
        assert_eq!(outcome.added(), 1);
        assert_eq!(outcome.updated(), 2);
    }

    #[test]
    fn category_flips_that_cancel_out_are_not_a_change() {
        let local = vec![q("A", "X")];
        let remote = vec![q("A", "Y"), q("A", "X")];
        let outcome = reconcile(local.clone(), &remote, ConflictPolicy::PreferRemote);
        assert_eq!(outcome.merged, local);
        assert_eq!(outcome.updated(), 2);
        assert!(!outcome.changed());
    }

    #[test]
    fn repeated_reconciles_never_duplicate_text() {
        let snapshots = vec![
            vec![q("A", "General"), q("B", "General")],
            vec![q("B", "General"), q("C", "General"), q("C", "General")],
            vec![q("A", "Other"), q("D", "General")],
            vec![],
            vec![q("D", "General"), q("A", "General"), q("E", "Misc")],
        ];

        for policy in [ConflictPolicy::KeepLocal, ConflictPolicy::PreferRemote] {
            let mut local = vec![q("A", "Mine")];
            for snapshot in &snapshots {
                local = reconcile(local, snapshot, policy).merged;
                let texts: HashSet<&str> = local.iter().map(|q| q.text.as_str()).collect();
                assert_eq!(texts.len(), local.len(), "duplicate text under {policy}");
            }
        }
    }

    #[test]
    fn empty_remote_changes_nothing() {
        let local = vec![q("A", "X")];
        let outcome = reconcile(local.clone(), &[], ConflictPolicy::KeepLocal);
        assert_eq!(outcome.merged, local);
        assert!(outcome.notifications.is_empty());
        assert!(!outcome.changed());
    }

    #[test]
    fn conflict_policy_parses_known_names() {
        assert_eq!(
            "keep_local".parse::<ConflictPolicy>().expect("parse"),
            ConflictPolicy::KeepLocal
        );
        assert_eq!(
            " Prefer-Remote ".parse::<ConflictPolicy>().expect("parse"),
            ConflictPolicy::PreferRemote
        );
        assert!("newest".parse::<ConflictPolicy>().is_err());
    }

    #[test]
    fn sync_status_serialization_is_camel_case() {
        let status = SyncEngineStatus {
            last_cycle_status: Some("ok".into()),
            last_cycle_duration_ms: Some(12),
            ..Default::default()
        };
        let json = serde_json::to_value(&status).expect("serialize");
        assert_eq!(json["lastCycleStatus"], "ok");
        assert_eq!(json["lastCycleDurationMs"], 12);
    }
}
