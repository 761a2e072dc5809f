use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::error::SqlEmulatorError;

pub(crate) type SharedSqliteConnection = Arc<tokio::sync::Mutex<rusqlite::Connection>>;

const CONNECTION_PRAGMAS: &str = "PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;";

/// Open handle to one logical database.
///
/// Clones share the same `rusqlite::Connection`; every operation runs on the blocking pool
/// while holding the connection lock, so concurrent pipelines interleave per statement.
#[derive(Clone)]
pub struct SqliteHandle {
    name: Arc<str>,
    conn: SharedSqliteConnection,
}

impl SqliteHandle {
    /// Open (creating if needed) the database file at `path`.
    ///
    /// # Errors
    /// Returns `SqlEmulatorError::SqliteError` if the file cannot be opened or the connection
    /// pragmas fail.
    pub fn open(name: &str, path: &Path) -> Result<Self, SqlEmulatorError> {
        let conn = rusqlite::Connection::open(path)?;
        conn.execute_batch(CONNECTION_PRAGMAS)?;
        Ok(Self::from_connection(name, conn))
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns `SqlEmulatorError::SqliteError` if `SQLite` cannot allocate the database.
    pub fn open_in_memory(name: &str) -> Result<Self, SqlEmulatorError> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Ok(Self::from_connection(name, conn))
    }

    fn from_connection(name: &str, conn: rusqlite::Connection) -> Self {
        Self {
            name: Arc::from(name),
            conn: Arc::new(tokio::sync::Mutex::new(conn)),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run synchronous `rusqlite` logic against the connection on the blocking pool.
    ///
    /// # Errors
    /// Propagates the closure's error, or `SqlEmulatorError::ExecutionError` if the blocking
    /// task panicked or was cancelled.
    pub async fn with_connection<F, R>(&self, func: F) -> Result<R, SqlEmulatorError>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlEmulatorError> + Send + 'static,
        R: Send + 'static,
    {
        run_blocking(Arc::clone(&self.conn), func).await
    }

    /// Execute a script of one or more statements with no parameters and no results.
    ///
    /// # Errors
    /// Returns `SqlEmulatorError::ExecutionError` carrying the engine message if any statement
    /// fails.
    pub async fn execute_batch(&self, sql: String) -> Result<(), SqlEmulatorError> {
        self.with_connection(move |conn| {
            conn.execute_batch(&sql)
                .map_err(|e| SqlEmulatorError::execution(&e))
        })
        .await
    }
}

impl fmt::Debug for SqliteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteHandle")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, SqlEmulatorError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, SqlEmulatorError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| SqlEmulatorError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}
