//! Infrastructure: SQLite connection pool, migrations, schema catalog.

pub mod db;
pub mod schema;

pub(crate) use db::get_connection;
pub use db::{init_db, DbPool, PoolOptions, PoolStatus, PooledConnection};
pub use schema::Table;
