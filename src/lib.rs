pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;

use config::AppConfig;
use infra::{init_db, DbPool};

/// Open the configured database and start its pool.
pub fn start(config: &AppConfig) -> Result<DbPool, error::AppError> {
    let db_path = config.db_path();
    log::info!("DB path: {:?}", db_path);
    init_db(&db_path, config.pool_options()?).map_err(|e| {
        log::error!("DB init failed: {}", e);
        e
    })
}
