//! SQLite-backed persistent cache store.
//! Entries survive restarts; expired rows are deleted when read and by
//! `cleanup_expired`. Storage failures are logged, never surfaced.

use std::path::Path;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{info, warn};

use super::CacheStore;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the cache database at the given path.
    pub fn open(db_path: &Path) -> Result<Self, String> {
        let conn = Connection::open(db_path)
            .map_err(|e| format!("failed to open cache database: {e}"))?;

        // WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| format!("PRAGMA failed: {e}"))?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv_cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_kv_expires
                ON kv_cache(expires_at);",
        )
        .map_err(|e| format!("create table failed: {e}"))?;

        info!(path = %db_path.display(), "SQLite cache store opened");

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Remove every expired entry. Useful from a periodic maintenance task;
    /// reads already evict lazily.
    pub fn cleanup_expired(&self) -> usize {
        let conn = self.conn.lock();
        match conn.execute(
            "DELETE FROM kv_cache WHERE expires_at <= ?1",
            params![now_unix()],
        ) {
            Ok(count) => {
                if count > 0 {
                    info!(removed = count, "cache cleanup");
                }
                count
            }
            Err(e) => {
                warn!(error = %e, "cache cleanup failed");
                0
            }
        }
    }
}

impl CacheStore for SqliteStore {
    fn get(&self, key: &str) -> Option<String> {
        let conn = self.conn.lock();
        let now = now_unix();

        let hit: Option<String> = conn
            .query_row(
                "SELECT value FROM kv_cache WHERE key = ?1 AND expires_at > ?2",
                params![key, now],
                |row| row.get(0),
            )
            .optional()
            .unwrap_or_else(|e| {
                warn!(error = %e, "cache read failed");
                None
            });

        if hit.is_none() {
            // Drop the stale row, if that is why we missed.
            let _ = conn.execute(
                "DELETE FROM kv_cache WHERE key = ?1 AND expires_at <= ?2",
                params![key, now],
            );
        }
        hit
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) {
        let conn = self.conn.lock();
        let expires_at = now_unix() + ttl.as_secs() as i64;
        if let Err(e) = conn.execute(
            "INSERT OR REPLACE INTO kv_cache (key, value, expires_at)
             VALUES (?1, ?2, ?3)",
            params![key, value, expires_at],
        ) {
            warn!(error = %e, "cache write failed");
        }
    }

    fn clear_prefix(&self, prefix: &str) -> usize {
        let conn = self.conn.lock();
        let pattern = format!("{}%", escape_like(prefix));
        match conn.execute(
            "DELETE FROM kv_cache WHERE key LIKE ?1 ESCAPE '\\'",
            params![pattern],
        ) {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "cache clear failed");
                0
            }
        }
    }
}

/// Escape LIKE wildcards so the prefix matches literally.
fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// Current time as Unix timestamp (seconds).
fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
