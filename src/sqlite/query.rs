use rusqlite::types::Value;

use crate::error::SqlEmulatorError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `SqlEmulatorError` if the value cannot be read.
pub fn sqlite_extract_value_sync(
    row: &rusqlite::Row,
    idx: usize,
) -> Result<RowValues, SqlEmulatorError> {
    let value: Value = row.get(idx).map_err(|e| SqlEmulatorError::execution(&e))?;
    Ok(RowValues::from(value))
}

/// Run an already-bound statement and materialise every row.
///
/// # Errors
/// Returns `SqlEmulatorError::ExecutionError` if stepping the statement or reading a value
/// fails.
pub fn build_result_set(stmt: &mut rusqlite::Statement<'_>) -> Result<ResultSet, SqlEmulatorError> {
    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(std::string::ToString::to_string)
        .collect();
    let col_count = column_names.len();

    let mut rows_iter = stmt.raw_query();
    let mut rows = Vec::new();
    while let Some(row) = rows_iter
        .next()
        .map_err(|e| SqlEmulatorError::execution(&e))?
    {
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(sqlite_extract_value_sync(row, i)?);
        }
        rows.push(row_values);
    }

    Ok(ResultSet::from_rows(column_names, rows))
}

/// Step an already-bound statement to completion, discarding any rows it yields.
///
/// # Errors
/// Returns `SqlEmulatorError::ExecutionError` if stepping the statement fails.
pub fn drain_statement(stmt: &mut rusqlite::Statement<'_>) -> Result<(), SqlEmulatorError> {
    let mut rows_iter = stmt.raw_query();
    while rows_iter
        .next()
        .map_err(|e| SqlEmulatorError::execution(&e))?
        .is_some()
    {}
    Ok(())
}
