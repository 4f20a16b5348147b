//! Repository for the `app_state` key/value table.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use diesel::prelude::*;
use log::debug;

use quotesync_core::{Result, Storage};

use super::model::AppStateDB;
use crate::db::{create_in_memory_pool, create_pool, get_connection, DbPool};
use crate::errors::StorageError;
use crate::schema::app_state;

/// Durable [`Storage`] backed by SQLite.
#[derive(Clone)]
pub struct SqliteStorage {
    pool: Arc<DbPool>,
}

impl SqliteStorage {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Opens the database file at `path`, creating it and its parent
    /// directories on first use.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let pool = create_pool(path.as_ref())?;
        Ok(Self::new(pool))
    }

    pub fn open_in_memory() -> Result<Self> {
        let pool = create_in_memory_pool()?;
        Ok(Self::new(pool))
    }

    /// Raw row for `key`, including its last write time.
    pub fn get_entry(&self, key: &str) -> Result<Option<AppStateDB>> {
        let mut conn = get_connection(&self.pool)?;
        let row = app_state::table
            .find(key)
            .select(AppStateDB::as_select())
            .first::<AppStateDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row)
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        let keys = app_state::table
            .select(app_state::key)
            .order(app_state::key.asc())
            .load::<String>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(keys)
    }
}

impl Storage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        let value = app_state::table
            .find(key)
            .select(app_state::value)
            .first::<String>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;
        let row = AppStateDB {
            key: key.to_string(),
            value: value.to_string(),
            updated_at: Utc::now().to_rfc3339(),
        };
        diesel::insert_into(app_state::table)
            .values(&row)
            .on_conflict(app_state::key)
            .do_update()
            .set((
                app_state::value.eq(&row.value),
                app_state::updated_at.eq(&row.updated_at),
            ))
            .execute(&mut conn)
            .map_err(StorageError::from)?;
        debug!("[Storage] Wrote key '{}' ({} bytes)", key, value.len());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut conn = get_connection(&self.pool)?;
        diesel::delete(app_state::table.find(key))
            .execute(&mut conn)
            .map_err(StorageError::from)?;
        Ok(())
    }
}
