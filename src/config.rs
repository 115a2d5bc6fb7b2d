//! Process configuration: command-line flags with environment fallbacks.

use crate::error::AppError;
use crate::infra::PoolOptions;
use std::path::PathBuf;
use std::time::Duration;

#[derive(clap::Args, Debug, Clone)]
pub struct AppConfig {
    /// SQLite file [default: <data dir>/meal-planner/meal_planner.db]
    #[arg(long = "db", env = "MEAL_PLANNER_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Connections opened at start and kept idle
    #[arg(long, env = "MEAL_PLANNER_POOL_MIN", default_value_t = 1, global = true)]
    pub pool_min: u32,

    /// Hard cap on open connections
    #[arg(long, env = "MEAL_PLANNER_POOL_MAX", default_value_t = 3, global = true)]
    pub pool_max: u32,

    /// Seconds to wait for a free connection
    #[arg(long, env = "MEAL_PLANNER_POOL_TIMEOUT_SECS", default_value_t = 60, global = true)]
    pub pool_timeout_secs: u64,

    /// Seconds to wait for in-flight work on shutdown
    #[arg(long, env = "MEAL_PLANNER_CLOSE_GRACE_SECS", default_value_t = 10, global = true)]
    pub close_grace_secs: u64,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(
        long = "log",
        env = "MEAL_PLANNER_LOG",
        default_value = "info",
        value_parser = parse_level,
        global = true
    )]
    pub log_level: log::LevelFilter,
}

fn app_data_dir() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("meal-planner")
}

fn parse_level(raw: &str) -> Result<log::LevelFilter, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("unknown log level '{raw}'"))
}

impl AppConfig {
    pub fn db_path(&self) -> PathBuf {
        self.db
            .clone()
            .unwrap_or_else(|| app_data_dir().join("meal_planner.db"))
    }

    pub fn pool_options(&self) -> Result<PoolOptions, AppError> {
        let options = PoolOptions {
            min: self.pool_min,
            max: self.pool_max,
            acquire_timeout: Duration::from_secs(self.pool_timeout_secs),
        };
        options.validate()?;
        Ok(options)
    }

    pub fn close_grace(&self) -> Duration {
        Duration::from_secs(self.close_grace_secs)
    }
}
