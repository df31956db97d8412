// SQLite-backed response cache keyed by request URL.
//
// Read and write failures after the cache is open are logged and treated as
// misses; a broken cache never fails a request.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};

use crate::error::CacheError;

/// File name of the cache database inside the cache directory.
pub const CACHE_DB_FILE: &str = "responses.db";

pub struct ResponseCache {
    conn: Mutex<Connection>,
    max_age: Option<Duration>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("path", &self.path)
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl ResponseCache {
    /// Open (or create) the cache database in `dir`, creating the directory
    /// if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(CACHE_DB_FILE);
        let conn = Connection::open(&path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Self::init(conn, Some(path))
    }

    /// Ephemeral cache, for tests.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self, CacheError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS responses (
                key        TEXT PRIMARY KEY,
                body       TEXT NOT NULL,
                fetched_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
            max_age: None,
            path,
        })
    }

    /// Entries older than `max_age` are treated as misses and deleted.
    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    /// Location of the database file, `None` for in-memory caches.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        // A poisoned lock only means another thread panicked mid-statement;
        // SQLite itself is still consistent.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let row: Option<(String, String)> = match self
            .conn()
            .query_row(
                "SELECT body, fetched_at FROM responses WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
        {
            Ok(row) => row,
            Err(e) => {
                warn!(key, "cache read error: {e}");
                return None;
            }
        };

        let (body, fetched_at) = row?;
        if self.is_expired(&fetched_at) {
            debug!(key, "cache entry expired");
            self.remove(key);
            return None;
        }
        Some(body)
    }

    pub fn put(&self, key: &str, body: &str) {
        let now = Utc::now().to_rfc3339();
        if let Err(e) = self.conn().execute(
            "INSERT OR REPLACE INTO responses (key, body, fetched_at) VALUES (?1, ?2, ?3)",
            params![key, body, now],
        ) {
            warn!(key, "cache write error: {e}");
        }
    }

    /// Returns whether an entry was removed.
    pub fn remove(&self, key: &str) -> bool {
        match self
            .conn()
            .execute("DELETE FROM responses WHERE key = ?1", params![key])
        {
            Ok(n) => n > 0,
            Err(e) => {
                warn!(key, "cache remove error: {e}");
                false
            }
        }
    }

    pub fn clear(&self) {
        if let Err(e) = self.conn().execute("DELETE FROM responses", []) {
            warn!("error clearing response cache: {e}");
        }
    }

    pub fn len(&self) -> usize {
        match self
            .conn()
            .query_row("SELECT COUNT(*) FROM responses", [], |row| row.get::<_, i64>(0))
        {
            Ok(n) => n as usize,
            Err(e) => {
                warn!("cache count error: {e}");
                0
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn is_expired(&self, fetched_at: &str) -> bool {
        let Some(max_age) = self.max_age else {
            return false;
        };
        let Ok(fetched) = DateTime::parse_from_rfc3339(fetched_at) else {
            return true;
        };
        let age = Utc::now().signed_duration_since(fetched.with_timezone(&Utc));
        age.to_std().map_or(false, |age| age > max_age)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
