//! Store-level use cases: connectivity, schema reset, row counts.

use crate::error::AppError;
use crate::infra::schema::{self, Table};
use crate::infra::{get_connection, DbPool};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableCountDto {
    pub table: Table,
    pub count: i64,
}

/// True when a connection can be borrowed and answers a trivial query.
pub fn check_connection(pool: &DbPool) -> bool {
    let result = get_connection(pool).and_then(|conn| {
        conn.query_row("SELECT 1", [], |r| r.get::<_, i64>(0))
            .map_err(AppError::from)
    });
    match result {
        Ok(_) => true,
        Err(e) => {
            log::warn!("Connection check failed: {}", e);
            false
        }
    }
}

/// Drop and recreate every table. Safe on an empty or partially created store.
pub fn schema_reset(pool: &DbPool) -> Result<(), AppError> {
    let conn = get_connection(pool)?;
    schema::reset(&conn)?;
    log::info!("Schema reset");
    Ok(())
}

pub fn table_count(pool: &DbPool, table: Table) -> Result<i64, AppError> {
    let conn = get_connection(pool)?;
    schema::count_rows(&conn, table)
}

pub fn table_counts(pool: &DbPool) -> Result<Vec<TableCountDto>, AppError> {
    let conn = get_connection(pool)?;
    Table::all()
        .iter()
        .map(|&table| -> Result<TableCountDto, AppError> {
            Ok(TableCountDto {
                table,
                count: schema::count_rows(&conn, table)?,
            })
        })
        .collect()
}
