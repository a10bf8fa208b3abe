// Key-value persistence backends

use chrono::Utc;
use eyre::{Context, Result, eyre};
use fs2::FileExt;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Durable slot store used by the request store
pub trait Storage: Send {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Which backend to open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    File,
    Sqlite,
}

/// Open the configured backend rooted at `dir`
pub fn open_storage(kind: StorageKind, dir: &Path) -> Result<Box<dyn Storage>> {
    match kind {
        StorageKind::File => Ok(Box::new(FileStorage::open(dir)?)),
        StorageKind::Sqlite => Ok(Box::new(SqliteStorage::open(dir.join("print-inbox.db"))?)),
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(eyre!("Storage key cannot be empty"));
    }
    if key.len() > 64 {
        return Err(eyre!("Storage key too long: {} (max 64 chars)", key));
    }
    if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(eyre!("Invalid storage key: {} (must be alphanumeric with _/-)", key));
    }
    Ok(())
}

// ============================================================================
// File backend
// ============================================================================

/// One JSON file per key: `{dir}/{key}.json`
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).context("Failed to create storage directory")?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn lock_file(&self, key: &str) -> Result<fs::File> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(format!("{}.lock", key)))
            .context("Failed to open storage lock file")
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let lock = self.lock_file(key)?;
        lock.lock_shared().context("Failed to acquire shared lock")?;
        let content = fs::read_to_string(&path).context("Failed to read storage file")?;
        Ok(Some(content))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.path_for(key);
        let tmp_path = self.dir.join(format!("{}.json.tmp", key));

        // Lock is released when the file handle drops
        let lock = self.lock_file(key)?;
        lock.lock_exclusive().context("Failed to acquire file lock")?;

        let mut tmp = fs::File::create(&tmp_path).context("Failed to create temp storage file")?;
        tmp.write_all(value.as_bytes())?;
        tmp.sync_all()?;
        fs::rename(&tmp_path, &path).context("Failed to replace storage file")?;

        debug!(file = ?path, bytes = value.len(), "Wrote storage slot");
        Ok(())
    }
}

// ============================================================================
// SQLite backend
// ============================================================================

/// Slots kept in a single `kv` table
pub struct SqliteStorage {
    db: Connection,
}

impl SqliteStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create storage directory")?;
        }
        let db = Connection::open(path).context("Failed to open SQLite database")?;
        let storage = Self { db };
        storage.create_schema()?;
        Ok(storage)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open SQLite database")?;
        let storage = Self { db };
        storage.create_schema()?;
        Ok(storage)
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating storage schema");
        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}

impl Storage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let value = self
            .db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.db.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, value, Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// Shared in-memory slots; clones see the same data
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let storage = Self::new();
        storage.insert(key, value);
        storage
    }

    fn insert(&self, key: &str, value: &str) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(key.to_string(), value.to_string());
        }
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let slots = self.slots.lock().map_err(|_| eyre!("Memory storage lock poisoned"))?;
        Ok(slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.insert(key, value);
        Ok(())
    }
}
