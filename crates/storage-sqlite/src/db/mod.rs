//! Connection pool setup and schema migrations.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{debug, info};

use crate::errors::StorageError;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const BUSY_TIMEOUT_MS: u64 = 5_000;
const MAX_POOL_SIZE: u32 = 4;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Debug)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {BUSY_TIMEOUT_MS}; PRAGMA synchronous = NORMAL;"
        ))
        .map_err(r2d2::Error::QueryError)
    }
}

/// Opens (creating if needed) the database file and applies migrations.
pub fn create_pool(db_path: &Path) -> Result<Arc<DbPool>, StorageError> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let database_url = db_path.to_string_lossy().to_string();
    let pool = build_pool(&database_url, MAX_POOL_SIZE)?;
    run_migrations(&pool)?;
    info!("[Storage] Opened database at {}", db_path.display());
    Ok(pool)
}

/// In-memory database. One connection only: each `:memory:` connection is a
/// separate database.
pub fn create_in_memory_pool() -> Result<Arc<DbPool>, StorageError> {
    let pool = build_pool(":memory:", 1)?;
    run_migrations(&pool)?;
    Ok(pool)
}

pub fn get_connection(pool: &DbPool) -> Result<DbConnection, StorageError> {
    Ok(pool.get()?)
}

fn build_pool(database_url: &str, max_size: u32) -> Result<Arc<DbPool>, StorageError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = Pool::builder()
        .max_size(max_size)
        .connection_timeout(Duration::from_secs(10))
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)?;
    Ok(Arc::new(pool))
}

fn run_migrations(pool: &DbPool) -> Result<(), StorageError> {
    let mut conn = get_connection(pool)?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| StorageError::Migration(e.to_string()))?;
    if !applied.is_empty() {
        debug!("[Storage] Applied {} migrations", applied.len());
    }
    Ok(())
}
