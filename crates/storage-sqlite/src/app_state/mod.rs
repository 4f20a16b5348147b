mod model;
mod repository;

pub use model::AppStateDB;
pub use repository::SqliteStorage;
