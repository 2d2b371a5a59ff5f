//! Storage layer for infusite.
//!
//! History is persisted as a single text blob under one key. [`BlobStore`]
//! is the seam between the record store and the backend; [`SqliteStore`] is
//! the persistent backend and [`MemoryStore`] the volatile one.

pub mod memory;
pub mod migrations;
pub mod records;
pub mod schema;

use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub use memory::MemoryStore;
pub use records::RecordStore;

/// Key-value storage of text blobs.
pub trait BlobStore {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete the value under `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: BlobStore + ?Sized> BlobStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// `SQLite`-backed blob store.
#[derive(Debug)]
pub struct SqliteStore {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl SqliteStore {
    /// Open or create a database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let blob_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM blobs", [], |row| row.get(0))?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            blob_count,
            db_size_bytes,
        })
    }
}

impl BlobStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM blobs WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO blobs (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            ",
            params![key, value],
        )?;
        debug!("Stored {} bytes under '{}'", value.len(), key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let affected = self.conn.execute("DELETE FROM blobs WHERE key = ?1", [key])?;
        debug!("Removed '{}' ({} rows)", key, affected);
        Ok(())
    }
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of stored blobs.
    pub blob_count: i64,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_storage() -> SqliteStore {
        SqliteStore::open_in_memory().expect("failed to create test storage")
    }

    #[test]
    fn test_open_in_memory() {
        let storage = create_test_storage();
        assert_eq!(storage.path().to_string_lossy(), ":memory:");
    }

    #[test]
    fn test_get_missing_key() {
        let storage = create_test_storage();
        assert!(storage.get("nothing").unwrap().is_none());
    }

    #[test]
    fn test_set_and_get() {
        let storage = create_test_storage();
        storage.set("k", "hello").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn test_set_replaces_value() {
        let storage = create_test_storage();
        storage.set("k", "one").unwrap();
        storage.set("k", "two").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("two"));
        assert_eq!(storage.stats().unwrap().blob_count, 1);
    }

    #[test]
    fn test_remove() {
        let storage = create_test_storage();
        storage.set("k", "v").unwrap();
        storage.remove("k").unwrap();
        assert!(storage.get("k").unwrap().is_none());

        // Removing again is fine
        storage.remove("k").unwrap();
    }

    #[test]
    fn test_keys_are_independent() {
        let storage = create_test_storage();
        storage.set("a", "1").unwrap();
        storage.set("b", "2").unwrap();
        storage.remove("a").unwrap();
        assert_eq!(storage.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_unicode_value() {
        let storage = create_test_storage();
        storage.set("k", "Abdômen Esquerdo 🩺").unwrap();
        assert_eq!(
            storage.get("k").unwrap().as_deref(),
            Some("Abdômen Esquerdo 🩺")
        );
    }

    #[test]
    fn test_stats_empty() {
        let stats = create_test_storage().stats().unwrap();
        assert_eq!(stats.blob_count, 0);
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[test]
    fn test_open_file_based_persists() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("history.db");

        {
            let storage = SqliteStore::open(&db_path).unwrap();
            storage.set("k", "persisted").unwrap();
            assert_eq!(storage.path(), db_path);
            assert!(storage.stats().unwrap().db_size_bytes > 0);
        }

        let reopened = SqliteStore::open(&db_path).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("persisted"));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let nested_path = dir.path().join("nested/deeper/history.db");

        let _storage = SqliteStore::open(&nested_path).unwrap();
        assert!(nested_path.exists());
    }
}
