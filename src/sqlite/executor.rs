use tracing::debug;

use crate::error::SqlEmulatorError;
use crate::results::{ResultSet, StatementDescription};

use super::connection::SqliteHandle;
use super::params::StatementParams;
use super::query::{build_result_set, drain_statement};

/// How a statement's outcome is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// Rows are returned; no change counters.
    Read,
    /// Run for effect; change counters are returned.
    Write,
}

/// Classify by leading keyword: `SELECT` and `PRAGMA` read, everything else writes.
#[must_use]
pub fn classify_statement(sql: &str) -> StatementKind {
    if starts_with_keyword(sql, "SELECT") || starts_with_keyword(sql, "PRAGMA") {
        StatementKind::Read
    } else {
        StatementKind::Write
    }
}

/// Whether `sql` looks like a script of several statements.
///
/// Purely textual: more than one `;`, or a single `;` that is not the last character. A
/// semicolon inside a string literal counts too.
#[must_use]
pub fn is_multi_statement(sql: &str) -> bool {
    let trimmed = sql.trim();
    match trimmed.matches(';').count() {
        0 => false,
        1 => !trimmed.ends_with(';'),
        _ => true,
    }
}

/// Whether `sql` is an `INSERT` or `REPLACE` (including `INSERT OR ...`), the statements that
/// assign a rowid.
#[must_use]
pub fn is_insert(sql: &str) -> bool {
    starts_with_keyword(sql, "INSERT") || starts_with_keyword(sql, "REPLACE")
}

fn starts_with_keyword(sql: &str, keyword: &str) -> bool {
    sql.trim_start()
        .get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
}

/// Execute one statement against `handle` on the blocking pool.
///
/// # Errors
/// Returns `SqlEmulatorError::ExecutionError` with the engine message if preparing, binding or
/// running the statement fails.
pub async fn execute_statement(
    handle: &SqliteHandle,
    sql: String,
    params: StatementParams,
) -> Result<ResultSet, SqlEmulatorError> {
    debug!(database = handle.name(), sql = %sql, "executing statement");
    handle
        .with_connection(move |conn| execute_statement_sync(conn, &sql, &params))
        .await
}

/// Execute one statement on a connection the caller already holds.
///
/// A multi-statement script with no parameters runs as a batch and reports nothing; anything
/// else is prepared as a single statement, so a parameterised script fails in the engine.
///
/// # Errors
/// Returns `SqlEmulatorError::ExecutionError` with the engine message if preparing, binding or
/// running the statement fails.
pub fn execute_statement_sync(
    conn: &rusqlite::Connection,
    sql: &str,
    params: &StatementParams,
) -> Result<ResultSet, SqlEmulatorError> {
    if params.is_empty() && is_multi_statement(sql) {
        conn.execute_batch(sql)
            .map_err(|e| SqlEmulatorError::execution(&e))?;
        return Ok(ResultSet::empty());
    }

    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| SqlEmulatorError::execution(&e))?;
    params.bind(&mut stmt)?;

    match classify_statement(sql) {
        StatementKind::Read => build_result_set(&mut stmt),
        StatementKind::Write => {
            let before = ChangeCounters::read(conn)?;
            drain_statement(&mut stmt)?;
            let after = ChangeCounters::read(conn)?;
            Ok(after.since(&before, is_insert(sql)))
        }
    }
}

/// Connection-level counters sampled around a write.
struct ChangeCounters {
    changes: i64,
    total_changes: i64,
    last_insert_rowid: i64,
}

impl ChangeCounters {
    fn read(conn: &rusqlite::Connection) -> Result<Self, SqlEmulatorError> {
        conn.query_row(
            "SELECT changes(), total_changes(), last_insert_rowid()",
            [],
            |row| {
                Ok(Self {
                    changes: row.get(0)?,
                    total_changes: row.get(1)?,
                    last_insert_rowid: row.get(2)?,
                })
            },
        )
        .map_err(|e| SqlEmulatorError::execution(&e))
    }

    // `changes()` and `last_insert_rowid()` keep the values of the last row change, so a
    // statement that touched no rows would otherwise report stale ones.
    fn since(&self, before: &Self, inserted: bool) -> ResultSet {
        if self.total_changes == before.total_changes {
            return ResultSet::from_changes(0, None);
        }
        let rows_affected = u64::try_from(self.changes).unwrap_or(0);
        ResultSet::from_changes(rows_affected, inserted.then_some(self.last_insert_rowid))
    }
}

/// Prepare `sql` without running it and report its parameters and columns.
///
/// # Errors
/// Returns `SqlEmulatorError::ExecutionError` if the statement cannot be prepared.
pub async fn describe_statement(
    handle: &SqliteHandle,
    sql: String,
) -> Result<StatementDescription, SqlEmulatorError> {
    handle
        .with_connection(move |conn| describe_statement_sync(conn, &sql))
        .await
}

/// Synchronous core of [`describe_statement`].
///
/// # Errors
/// Returns `SqlEmulatorError::ExecutionError` if the statement cannot be prepared.
pub fn describe_statement_sync(
    conn: &rusqlite::Connection,
    sql: &str,
) -> Result<StatementDescription, SqlEmulatorError> {
    let stmt = conn
        .prepare(sql)
        .map_err(|e| SqlEmulatorError::execution(&e))?;
    let params = (1..=stmt.parameter_count())
        .map(|idx| stmt.parameter_name(idx).map(str::to_string))
        .collect();
    let columns = stmt
        .columns()
        .iter()
        .map(|col| (col.name().to_string(), col.decl_type().map(str::to_string)))
        .collect();
    Ok(StatementDescription {
        params,
        columns,
        is_explain: starts_with_keyword(sql, "EXPLAIN"),
        is_readonly: stmt.readonly(),
    })
}
