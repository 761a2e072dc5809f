use crate::error::SqlEmulatorError;
use crate::protocol::Stmt;
use crate::registry::SqlCache;

/// Produce the SQL text a request refers to.
///
/// Literal text wins over a stored id. The cache must belong to the database the request
/// targets, which keeps ids from leaking between databases.
///
/// # Errors
/// Returns `SqlEmulatorError::StatementNotFound` if the id has no stored text, or
/// `SqlEmulatorError::NoStatementProvided` if neither text nor id was given.
pub fn resolve_sql(
    sql: Option<&str>,
    sql_id: Option<i64>,
    cache: &SqlCache,
) -> Result<String, SqlEmulatorError> {
    match (sql, sql_id) {
        (Some(sql), _) => Ok(sql.to_string()),
        (None, Some(id)) => cache.get(id).ok_or(SqlEmulatorError::StatementNotFound(id)),
        (None, None) => Err(SqlEmulatorError::NoStatementProvided),
    }
}

/// [`resolve_sql`] for a statement request.
///
/// # Errors
/// See [`resolve_sql`].
pub fn resolve_stmt(stmt: &Stmt, cache: &SqlCache) -> Result<String, SqlEmulatorError> {
    resolve_sql(stmt.sql.as_deref(), stmt.sql_id, cache)
}
