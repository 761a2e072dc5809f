use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlEmulatorError {
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Value decode error: {0}")]
    DecodeError(String),

    #[error("SQL text with id {0} has not been stored")]
    StatementNotFound(i64),

    #[error("Statement has neither SQL text nor a SQL id")]
    NoStatementProvided,

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Unsupported request: {0}")]
    UnsupportedRequest(String),

    #[error("Database `{0}` already exists")]
    DatabaseExists(String),

    #[error("Database `{0}` not found")]
    DatabaseNotFound(String),

    #[error("Invalid database name: {0:?}")]
    InvalidDatabaseName(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SqlEmulatorError {
    /// Wrap an engine failure raised while preparing, binding or running a statement.
    #[must_use]
    pub fn execution(err: &rusqlite::Error) -> Self {
        SqlEmulatorError::ExecutionError(err.to_string())
    }
}
