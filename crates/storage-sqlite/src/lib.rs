//! SQLite persistence for the quote store.
//!
//! Values live in a single `app_state` key/value table so the core store can
//! keep its plain JSON layout for every key.

pub mod app_state;
pub mod db;
pub mod errors;
pub mod schema;

pub use app_state::{AppStateDB, SqliteStorage};
pub use db::{create_in_memory_pool, create_pool, get_connection, DbPool};
pub use errors::StorageError;
