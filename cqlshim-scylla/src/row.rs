//! Turning driver results into [`ResultSet`]s.

use cqlshim_query::{ResultSet, Value};
use scylla::QueryResult;
use scylla::frame::response::result::Row;

use crate::error::ScyllaResult;
use crate::types::from_cql;

/// Convert a driver result into a backend-agnostic result set.
///
/// Results without rows (acknowledged mutations, schema changes) become an
/// empty result set.
pub fn into_result_set(result: QueryResult) -> ScyllaResult<ResultSet> {
    let columns: Vec<String> = result.col_specs().iter().map(|spec| spec.name.clone()).collect();
    match result.rows {
        Some(rows) => build(columns, rows),
        None => Ok(ResultSet::empty()),
    }
}

/// Rows affected by a statement.
///
/// The protocol reports no counts for mutations; an acknowledged mutation
/// counts as one, a row-returning statement counts its rows.
#[must_use]
pub fn rows_affected(result: &QueryResult) -> u64 {
    result.rows.as_ref().map_or(1, |rows| rows.len() as u64)
}

fn build(columns: Vec<String>, rows: Vec<Row>) -> ScyllaResult<ResultSet> {
    let rows = rows
        .into_iter()
        .map(|row| row.columns.into_iter().map(from_cql).collect::<ScyllaResult<Vec<Value>>>())
        .collect::<ScyllaResult<Vec<_>>>()?;
    Ok(ResultSet::new(columns, rows))
}
