//! Key-value persistence behind a swappable `Store` trait.
//!
//! Backends: in-memory map, a single JSON file, and SQLite. Values are opaque
//! strings; the typed layers above serialize to JSON and wrap every record in a
//! version envelope.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Schema version written into every persisted record.
pub const SCHEMA_VERSION: u32 = 1;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for key-value storage backends.
///
/// Each call is atomic from the caller's point of view. Implementations must be
/// usable from several threads, but no ordering beyond last-writer-wins is promised.
pub trait Store: Send + Sync {
    /// Read the raw value for `key`.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// All keys currently stored.
    fn keys(&self) -> StoreResult<Vec<String>>;
}

/// Process-local store, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.entries.lock().keys().cloned().collect())
    }
}

/// All records in one JSON object file, rewritten on every mutation.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Create a store backed by `path`. The file is created lazily on first write.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> StoreResult<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Load for a read-modify-write cycle. A corrupt file is replaced rather
    /// than blocking every future write.
    fn read_for_update(&self) -> StoreResult<BTreeMap<String, String>> {
        match self.read_all() {
            Err(StoreError::Serialization(e)) => {
                tracing::warn!("Discarding unreadable store file {:?}: {}", self.path, e);
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let _guard = self.lock.lock();
        let mut entries = self.read_for_update()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let _guard = self.lock.lock();
        let mut entries = self.read_for_update()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.into_keys().collect())
    }
}

/// SQLite-backed store using a single `kv` table.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store (for testing).
    #[cfg(test)]
    pub fn in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl Store for SqliteStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.conn.lock().execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.conn
            .lock()
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }
}

#[derive(Serialize)]
struct RecordOut<'a, T> {
    version: u32,
    data: &'a T,
}

#[derive(Deserialize)]
struct RecordIn<T> {
    version: u32,
    data: T,
}

/// Read a versioned JSON record. Missing, corrupt, or foreign-version records
/// all read as `None`.
pub fn read_record<T: DeserializeOwned>(store: &dyn Store, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", key, e);
            return None;
        }
    };

    match serde_json::from_str::<RecordIn<T>>(&raw) {
        Ok(record) if record.version == SCHEMA_VERSION => Some(record.data),
        Ok(record) => {
            tracing::warn!(
                "Ignoring {} with schema version {} (expected {})",
                key,
                record.version,
                SCHEMA_VERSION
            );
            None
        }
        Err(e) => {
            tracing::warn!("Ignoring unreadable record {}: {}", key, e);
            None
        }
    }
}

/// Write a versioned JSON record. Failures are logged and swallowed.
pub fn write_record<T: Serialize>(store: &dyn Store, key: &str, data: &T) {
    let record = RecordOut {
        version: SCHEMA_VERSION,
        data,
    };
    let result = serde_json::to_string(&record)
        .map_err(StoreError::from)
        .and_then(|json| store.set(key, &json));
    if let Err(e) = result {
        tracing::warn!("Failed to write {}: {}", key, e);
    }
}

/// Delete a record. Failures are logged and swallowed.
pub fn remove_record(store: &dyn Store, key: &str) {
    if let Err(e) = store.remove(key) {
        tracing::warn!("Failed to remove {}: {}", key, e);
    }
}
