mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::config::SigningConfig;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared by every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    /// Stores, settings and product categories
    pub db: DbPool,
    /// Secrets and policy for platform request signatures
    pub signing: SigningConfig,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    Pool::builder().max_size(10).build(manager)
}
