//! Core domain logic for quote sync.
//!
//! Owns the quote model, the local store and its storage capability, the
//! reconciliation engine, outbound sync, and the poll scheduler. Transport
//! and durable storage live in sibling crates behind the traits defined here.

pub mod config;
pub mod errors;
pub mod events;
pub mod quotes;
pub mod storage;
pub mod sync;

pub use config::SyncConfig;
pub use errors::{Error, Result};
pub use events::{LogNotificationSink, Notification, NotificationSink};
pub use quotes::{CategoryFilter, LocalStore, Quote, PLACEHOLDER_CATEGORY};
pub use storage::{MemoryStorage, Storage};
pub use sync::{
    push_quotes, reconcile, AddQuoteOutcome, ConflictPolicy, PollScheduler, PushOutcome,
    QuoteSyncService, ReconcileOutcome, RemoteQuoteSource, SyncCycleResult, SyncCycleTrigger,
    SyncEngineStatus,
};
