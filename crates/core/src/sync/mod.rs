//! Sync domain models and services.

mod quote_sync_model;
mod quote_sync_service;
mod sync_engine;
mod sync_scheduler;

pub use quote_sync_model::*;
pub use quote_sync_service::*;
pub use sync_engine::*;
pub use sync_scheduler::*;
