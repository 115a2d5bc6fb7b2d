//! SQLite connection pool, lifecycle and migrations.

use crate::error::AppError;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A connection on loan from a [`DbPool`]; returned to the pool on drop.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const CLOSE_POLL: Duration = Duration::from_millis(10);

/// Sizing and wait limits for a [`DbPool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    /// Connections opened at init and kept idle afterwards.
    pub min: u32,
    /// Hard cap on open connections; callers beyond it wait.
    pub max: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            min: 1,
            max: 3,
            acquire_timeout: Duration::from_secs(60),
        }
    }
}

impl PoolOptions {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max == 0 {
            return Err(AppError::Config("pool max must be at least 1".into()));
        }
        if self.min > self.max {
            return Err(AppError::Config(format!(
                "pool min ({}) exceeds max ({})",
                self.min, self.max
            )));
        }
        if self.acquire_timeout.is_zero() {
            return Err(AppError::Config("pool acquire timeout must be positive".into()));
        }
        Ok(())
    }
}

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub open: u32,
    pub idle: u32,
    pub in_use: u32,
    pub closed: bool,
}

/// Bounded pool of SQLite connections. Cloning shares the same pool.
#[derive(Clone)]
pub struct DbPool {
    pool: Pool<SqliteConnectionManager>,
    closed: Arc<AtomicBool>,
}

impl DbPool {
    fn open(manager: SqliteConnectionManager, options: PoolOptions) -> Result<Self, AppError> {
        options.validate()?;
        let manager = manager.with_init(|c| {
            c.busy_timeout(Duration::from_secs(5))?;
            c.execute_batch("PRAGMA foreign_keys = ON;")
        });

        // Idle connections never expire: a shared in-memory store lives only
        // while one of them stays open.
        let pool = Pool::builder()
            .min_idle(Some(options.min))
            .max_size(options.max)
            .connection_timeout(options.acquire_timeout)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(manager)?;

        let pool = DbPool {
            pool,
            closed: Arc::new(AtomicBool::new(false)),
        };
        {
            let conn = pool.acquire()?;
            run_migrations(&conn)?;
        }

        log::info!(
            "Connection pool started (min={}, max={})",
            options.min,
            options.max
        );
        Ok(pool)
    }

    /// Borrow a connection, waiting up to the acquire timeout when the pool is exhausted.
    pub fn acquire(&self) -> Result<PooledConnection, AppError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(AppError::Pool("pool is closed".into()));
        }
        Ok(self.pool.get()?)
    }

    pub fn status(&self) -> PoolStatus {
        let state = self.pool.state();
        PoolStatus {
            open: state.connections,
            idle: state.idle_connections,
            in_use: state.connections - state.idle_connections,
            closed: self.closed.load(Ordering::SeqCst),
        }
    }

    /// Stop handing out connections and wait up to `grace` for checked-out
    /// ones to come back. Returns how many were still out when the grace
    /// period ended.
    pub fn close(&self, grace: Duration) -> u32 {
        self.closed.store(true, Ordering::SeqCst);
        let deadline = Instant::now() + grace;
        loop {
            let in_use = self.status().in_use;
            if in_use == 0 {
                log::info!("Pool closed");
                return 0;
            }
            let now = Instant::now();
            if now >= deadline {
                log::warn!(
                    "Pool closed with {} connection(s) still in use after {:?}",
                    in_use,
                    grace
                );
                return in_use;
            }
            std::thread::sleep(CLOSE_POLL.min(deadline - now));
        }
    }
}

/// Initialize DB at path, run migrations, return the pool.
pub fn init_db(db_path: &Path, options: PoolOptions) -> Result<DbPool, AppError> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| AppError::Pool(e.to_string()))?;
    }
    DbPool::open(SqliteConnectionManager::file(db_path), options)
}

/// Fresh private in-memory database with the schema applied.
pub fn init_test_db() -> DbPool {
    init_test_db_with(PoolOptions {
        min: 1,
        max: 3,
        acquire_timeout: Duration::from_secs(5),
    })
}

pub fn init_test_db_with(options: PoolOptions) -> DbPool {
    let uri = format!(
        "file:meal-planner-test-{}?mode=memory&cache=shared",
        Uuid::new_v4()
    );
    let manager = SqliteConnectionManager::file(uri).with_flags(
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    );
    DbPool::open(manager, options).expect("init test db")
}

const MIGRATIONS: &[(i32, &str)] = &[(1, include_str!("../../migrations/0001_init.sql"))];

pub(crate) fn run_migrations(conn: &Connection) -> Result<(), AppError> {
    let tx = conn.unchecked_transaction()?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (version INTEGER PRIMARY KEY, applied_at TEXT NOT NULL DEFAULT (datetime('now')))",
        [],
    )?;

    let applied: Vec<i32> = tx
        .prepare("SELECT version FROM schema_migrations ORDER BY version")?
        .query_map([], |r| r.get(0))?
        .collect::<Result<Vec<_>, _>>()?;

    for (version, sql) in MIGRATIONS {
        if applied.contains(version) {
            continue;
        }
        for stmt in sql.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            tx.execute(stmt, [])?;
        }
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, datetime('now'))",
            [version],
        )?;
        log::info!("Applied migration {}", version);
    }

    tx.commit()?;
    Ok(())
}

/// Get connection from pool (for use in operations).
pub fn get_connection(pool: &DbPool) -> Result<PooledConnection, AppError> {
    pool.acquire()
}
