//! Per-tenant database state.
//!
//! The [`DatabaseRegistry`] is built once at startup and shared by every request. It owns one
//! cached [`SqliteHandle`] per logical database and one [`SqlCache`] of stored SQL texts per
//! database name. Databases live as `<root>/<name>.db` files.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use regex::Regex;
use tracing::info;

use crate::error::SqlEmulatorError;
use crate::sqlite::SqliteHandle;

const DB_EXTENSION: &str = "db";

static DATABASE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,63}$").expect("database name pattern is valid")
});

// A panic while holding one of these locks leaves the maps consistent, so keep going.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Stored SQL texts of one database, keyed by client-chosen id.
///
/// Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct SqlCache {
    entries: Arc<Mutex<HashMap<i64, String>>>,
}

impl SqlCache {
    /// Insert or overwrite the text stored under `sql_id`.
    pub fn store(&self, sql_id: i64, sql: String) {
        lock(&self.entries).insert(sql_id, sql);
    }

    #[must_use]
    pub fn get(&self, sql_id: i64) -> Option<String> {
        lock(&self.entries).get(&sql_id).cloned()
    }

    /// Forget one id; returns whether it was stored.
    pub fn remove(&self, sql_id: i64) -> bool {
        lock(&self.entries).remove(&sql_id).is_some()
    }

    pub fn clear(&self) {
        lock(&self.entries).clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// File-backed registry of logical databases.
#[derive(Debug)]
pub struct DatabaseRegistry {
    root: PathBuf,
    handles: Mutex<HashMap<String, SqliteHandle>>,
    sql_caches: Mutex<HashMap<String, SqlCache>>,
}

impl DatabaseRegistry {
    /// Create a registry rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    /// Returns `SqlEmulatorError::Io` if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, SqlEmulatorError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            handles: Mutex::new(HashMap::new()),
            sql_caches: Mutex::new(HashMap::new()),
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check that `name` can be used as a database name (and as a file stem).
    ///
    /// # Errors
    /// Returns `SqlEmulatorError::InvalidDatabaseName` otherwise.
    pub fn validate_name(name: &str) -> Result<(), SqlEmulatorError> {
        if DATABASE_NAME.is_match(name) {
            Ok(())
        } else {
            Err(SqlEmulatorError::InvalidDatabaseName(name.to_string()))
        }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, SqlEmulatorError> {
        Self::validate_name(name)?;
        Ok(self.root.join(format!("{name}.{DB_EXTENSION}")))
    }

    /// Handle for `name`, opening (and creating) the database on first use.
    ///
    /// # Errors
    /// Returns `SqlEmulatorError::InvalidDatabaseName` for a bad name, or the engine error if
    /// the file cannot be opened.
    pub fn open(&self, name: &str) -> Result<SqliteHandle, SqlEmulatorError> {
        let mut handles = lock(&self.handles);
        if let Some(handle) = handles.get(name) {
            return Ok(handle.clone());
        }
        self.open_locked(&mut handles, name)
    }

    /// Create a new database.
    ///
    /// # Errors
    /// Returns `SqlEmulatorError::DatabaseExists` if the database is already open or on disk.
    pub fn create(&self, name: &str) -> Result<SqliteHandle, SqlEmulatorError> {
        let mut handles = lock(&self.handles);
        if handles.contains_key(name) || self.path_for(name)?.exists() {
            return Err(SqlEmulatorError::DatabaseExists(name.to_string()));
        }
        self.open_locked(&mut handles, name)
    }

    fn open_locked(
        &self,
        handles: &mut HashMap<String, SqliteHandle>,
        name: &str,
    ) -> Result<SqliteHandle, SqlEmulatorError> {
        let path = self.path_for(name)?;
        let handle = SqliteHandle::open(name, &path)?;
        info!(database = name, path = %path.display(), "opened database");
        handles.insert(name.to_string(), handle.clone());
        Ok(handle)
    }

    #[must_use]
    pub fn exists(&self, name: &str) -> bool {
        if lock(&self.handles).contains_key(name) {
            return true;
        }
        self.path_for(name).is_ok_and(|path| path.exists())
    }

    /// Close and remove a database; deleting a missing database is not an error.
    ///
    /// Returns whether anything was removed.
    ///
    /// # Errors
    /// Returns `SqlEmulatorError::InvalidDatabaseName` for a bad name or `Io` if a file cannot
    /// be removed.
    pub fn delete(&self, name: &str) -> Result<bool, SqlEmulatorError> {
        let path = self.path_for(name)?;
        // held until the files are gone so a concurrent `open` cannot reuse them
        let mut handles = lock(&self.handles);
        let was_open = handles.remove(name).is_some();
        lock(&self.sql_caches).remove(name);

        let mut removed = was_open;
        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.clone().into_os_string();
            file.push(suffix);
            match std::fs::remove_file(&file) {
                Ok(()) => removed = true,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        if removed {
            info!(database = name, "deleted database");
        }
        Ok(removed)
    }

    /// Names of every database on disk, sorted.
    ///
    /// # Errors
    /// Returns `SqlEmulatorError::Io` if the root directory cannot be read.
    pub fn list(&self) -> Result<Vec<String>, SqlEmulatorError> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DB_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if Self::validate_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// The stored-SQL cache of `name`, created empty on first reference.
    ///
    /// An invalid name gets a fresh cache that is not kept.
    #[must_use]
    pub fn sql_cache(&self, name: &str) -> SqlCache {
        if Self::validate_name(name).is_err() {
            return SqlCache::default();
        }
        lock(&self.sql_caches)
            .entry(name.to_string())
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_must_be_plain_identifiers() {
        for ok in ["default", "d1", "my-db", "my_db", "A9"] {
            assert!(DatabaseRegistry::validate_name(ok).is_ok(), "{ok}");
        }
        for bad in ["", "../etc", "a/b", "a.b", "-lead", "with space"] {
            assert!(
                matches!(
                    DatabaseRegistry::validate_name(bad),
                    Err(SqlEmulatorError::InvalidDatabaseName(_))
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn open_is_cached_and_creates_the_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let registry = DatabaseRegistry::new(dir.path())?;
        assert!(!registry.exists("d1"));
        let first = registry.open("d1")?;
        let second = registry.open("d1")?;
        assert_eq!(first.name(), second.name());
        assert!(registry.exists("d1"));
        assert!(dir.path().join("d1.db").exists());
        Ok(())
    }

    #[test]
    fn create_conflicts_until_deleted() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let registry = DatabaseRegistry::new(dir.path())?;
        registry.create("x")?;
        assert!(matches!(
            registry.create("x"),
            Err(SqlEmulatorError::DatabaseExists(_))
        ));
        assert!(registry.delete("x")?);
        assert!(!registry.delete("x")?);
        registry.create("x")?;
        Ok(())
    }

    #[test]
    fn list_reports_database_files() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let registry = DatabaseRegistry::new(dir.path())?;
        registry.open("b")?;
        registry.open("a")?;
        std::fs::write(dir.path().join("notes.txt"), "ignored")?;
        assert_eq!(registry.list()?, ["a", "b"]);
        Ok(())
    }

    #[test]
    fn sql_caches_are_per_database() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let registry = DatabaseRegistry::new(dir.path())?;
        registry.sql_cache("a").store(1, "SELECT 1".into());
        assert_eq!(registry.sql_cache("a").get(1).as_deref(), Some("SELECT 1"));
        assert!(registry.sql_cache("b").get(1).is_none());

        registry.open("a")?;
        registry.delete("a")?;
        assert!(registry.sql_cache("a").is_empty());
        Ok(())
    }

    #[test]
    fn invalid_names_get_throwaway_caches() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let registry = DatabaseRegistry::new(dir.path())?;
        for name in ["a.b", "c.d", "../up"] {
            registry.sql_cache(name).store(1, "SELECT 1".into());
            assert!(registry.sql_cache(name).get(1).is_none(), "{name}");
        }
        assert!(lock(&registry.sql_caches).is_empty());
        Ok(())
    }

    #[test]
    fn delete_leaves_no_files_behind() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let registry = DatabaseRegistry::new(dir.path())?;
        registry.open("gone")?;
        assert!(registry.delete("gone")?);
        assert!(!registry.exists("gone"));
        assert!(std::fs::read_dir(dir.path())?.next().is_none());

        registry.open("gone")?;
        assert_eq!(registry.list()?, ["gone"]);
        Ok(())
    }

    #[test]
    fn sql_cache_store_overwrites_and_remove_forgets() {
        let cache = SqlCache::default();
        cache.store(7, "SELECT 1".into());
        cache.store(7, "SELECT 2".into());
        assert_eq!(cache.get(7).as_deref(), Some("SELECT 2"));
        assert!(cache.remove(7));
        assert!(!cache.remove(7));
        cache.store(1, "x".into());
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
