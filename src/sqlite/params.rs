use rusqlite::types::Value;

use crate::error::SqlEmulatorError;
use crate::protocol::{Stmt, decode};
use crate::types::RowValues;

/// Prefixes `SQLite` accepts in front of a named parameter.
const NAMED_PREFIXES: [char; 3] = [':', '@', '$'];

/// Convert a single `RowValues` to a rusqlite `Value`.
#[must_use]
pub fn row_value_to_sqlite_value(value: &RowValues) -> Value {
    match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
        RowValues::Null => Value::Null,
    }
}

/// Parameters decoded from a statement request, ready to bind.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum StatementParams {
    #[default]
    Empty,
    Positional(Vec<Value>),
    Named(Vec<(String, Value)>),
}

impl StatementParams {
    /// Decode the arguments of a statement request.
    ///
    /// Named arguments take precedence: when both lists are non-empty the positional list is
    /// ignored without being decoded.
    ///
    /// # Errors
    ///
    /// Returns `SqlEmulatorError::DecodeError` if any bound value is malformed.
    pub fn from_stmt(stmt: &Stmt) -> Result<Self, SqlEmulatorError> {
        if !stmt.named_args.is_empty() {
            let named = stmt
                .named_args
                .iter()
                .map(|arg| {
                    let value = decode(&arg.value)?;
                    Ok((arg.name.clone(), row_value_to_sqlite_value(&value)))
                })
                .collect::<Result<Vec<_>, SqlEmulatorError>>()?;
            return Ok(StatementParams::Named(named));
        }
        if !stmt.args.is_empty() {
            let positional = stmt
                .args
                .iter()
                .map(|arg| decode(arg).map(|value| row_value_to_sqlite_value(&value)))
                .collect::<Result<Vec<_>, SqlEmulatorError>>()?;
            return Ok(StatementParams::Positional(positional));
        }
        Ok(StatementParams::Empty)
    }

    #[must_use]
    pub fn positional(values: &[RowValues]) -> Self {
        if values.is_empty() {
            StatementParams::Empty
        } else {
            StatementParams::Positional(values.iter().map(row_value_to_sqlite_value).collect())
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            StatementParams::Empty => true,
            StatementParams::Positional(values) => values.is_empty(),
            StatementParams::Named(values) => values.is_empty(),
        }
    }

    /// Bind onto a freshly prepared statement.
    ///
    /// # Errors
    ///
    /// Returns `SqlEmulatorError::ExecutionError` if a positional index is out of range or a
    /// named parameter does not appear in the statement.
    pub fn bind(&self, stmt: &mut rusqlite::Statement<'_>) -> Result<(), SqlEmulatorError> {
        match self {
            StatementParams::Empty => Ok(()),
            StatementParams::Positional(values) => {
                for (idx, value) in values.iter().enumerate() {
                    stmt.raw_bind_parameter(idx + 1, value)
                        .map_err(|e| SqlEmulatorError::execution(&e))?;
                }
                Ok(())
            }
            StatementParams::Named(values) => {
                for (name, value) in values {
                    let idx = named_parameter_index(stmt, name)?.ok_or_else(|| {
                        SqlEmulatorError::ExecutionError(format!(
                            "statement has no parameter named {name:?}"
                        ))
                    })?;
                    stmt.raw_bind_parameter(idx, value)
                        .map_err(|e| SqlEmulatorError::execution(&e))?;
                }
                Ok(())
            }
        }
    }
}

// Names without a prefix bind to whichever prefixed form the statement declares.
fn named_parameter_index(
    stmt: &rusqlite::Statement<'_>,
    name: &str,
) -> Result<Option<usize>, SqlEmulatorError> {
    if name.starts_with(NAMED_PREFIXES) {
        return stmt
            .parameter_index(name)
            .map_err(|e| SqlEmulatorError::execution(&e));
    }
    for prefix in NAMED_PREFIXES {
        let candidate = format!("{prefix}{name}");
        if let Some(idx) = stmt
            .parameter_index(&candidate)
            .map_err(|e| SqlEmulatorError::execution(&e))?
        {
            return Ok(Some(idx));
        }
    }
    Ok(None)
}
