//! SQLite-backed durable timeline store
//!
//! One row per handle holding the serialized timeline, the count it was
//! fetched with, and its fetch time.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::store::{CachedUserTimeline, TimelineStore, timeline_key};
use crate::error::CacheError;

/// Schema version - increment to trigger nuke-and-rebuild
const SCHEMA_VERSION: i32 = 2;

type Result<T> = std::result::Result<T, CacheError>;

/// SQLite-backed durable tier
pub struct SqliteTimelineStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteTimelineStore {
    /// Open or create the store at the default XDG cache location
    pub fn open() -> Result<Self> {
        let cache_dir = Self::cache_dir()?;
        Self::open_at(&cache_dir)
    }

    /// Get the cache directory path (~/.cache/draftgod on Linux)
    pub fn cache_dir() -> Result<PathBuf> {
        let cache_base = dirs::cache_dir().ok_or(CacheError::NoHome)?;
        Ok(cache_base.join("draftgod"))
    }

    /// Open the store in a specific directory (for testing)
    pub fn open_at(cache_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(cache_dir)
            .map_err(|e| CacheError::Io(format!("Failed to create cache dir: {}", e)))?;

        let db_path = cache_dir.join("cache.db");
        let conn = Connection::open(&db_path)?;

        let version: i32 = conn
            .pragma_query_value(None, "user_version", |r| r.get(0))
            .unwrap_or(0);

        if version != 0 && version != SCHEMA_VERSION {
            log::info!(
                "Cache schema version mismatch ({} != {}), rebuilding",
                version,
                SCHEMA_VERSION
            );
            drop(conn);
            std::fs::remove_file(&db_path)
                .map_err(|e| CacheError::Io(format!("Failed to remove cache DB: {}", e)))?;
            return Self::open_at(cache_dir);
        }

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS timelines (
                username TEXT PRIMARY KEY NOT NULL,
                tweets TEXT NOT NULL,
                fetched_count INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                size_bytes INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_updated_at ON timelines(updated_at);
            "#,
        )?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Load a timeline regardless of age
    pub fn load(&self, username: &str) -> Result<Option<CachedUserTimeline>> {
        let key = timeline_key(username);
        let row: Option<(String, i64, i64)> = self
            .conn()
            .query_row(
                "SELECT tweets, fetched_count, updated_at FROM timelines WHERE username = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((tweets, fetched_count, updated_at)) = row else {
            return Ok(None);
        };

        let tweets = serde_json::from_str(&tweets)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        let updated_at = DateTime::from_timestamp_millis(updated_at).ok_or_else(|| {
            CacheError::Serialization(format!("Invalid timestamp {} for @{}", updated_at, key))
        })?;

        Ok(Some(CachedUserTimeline {
            username: key,
            tweets,
            fetched_count: fetched_count.max(0) as usize,
            updated_at,
        }))
    }

    /// Replace the stored timeline for a handle
    pub fn save(&self, timeline: &CachedUserTimeline) -> Result<()> {
        let data = serde_json::to_string(&timeline.tweets)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        self.conn().execute(
            "INSERT OR REPLACE INTO timelines (username, tweets, fetched_count, updated_at, size_bytes)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                timeline_key(&timeline.username),
                data,
                timeline.fetched_count as i64,
                timeline.updated_at.timestamp_millis(),
                data.len()
            ],
        )?;
        Ok(())
    }

    /// Clear all stored timelines
    pub fn clear_all(&self) -> Result<ClearStats> {
        let conn = self.conn();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM timelines", [], |r| r.get(0))?;
        conn.execute("DELETE FROM timelines", [])?;

        Ok(ClearStats {
            entries_removed: count as usize,
        })
    }

    /// Store statistics; entries younger than `ttl` at `now` count as fresh
    pub fn stats(&self, now: DateTime<Utc>, ttl: Duration) -> Result<CacheStats> {
        let conn = self.conn();
        let cutoff = (now - ttl).timestamp_millis();

        let total_entries: i64 =
            conn.query_row("SELECT COUNT(*) FROM timelines", [], |r| r.get(0))?;

        let fresh_entries: i64 = conn.query_row(
            "SELECT COUNT(*) FROM timelines WHERE updated_at > ?1",
            [cutoff],
            |r| r.get(0),
        )?;

        let total_size: i64 = conn.query_row(
            "SELECT COALESCE(SUM(size_bytes), 0) FROM timelines",
            [],
            |r| r.get(0),
        )?;

        let (oldest, newest): (Option<i64>, Option<i64>) = conn.query_row(
            "SELECT MIN(updated_at), MAX(updated_at) FROM timelines",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;

        Ok(CacheStats {
            total_entries: total_entries as usize,
            fresh_entries: fresh_entries as usize,
            stale_entries: (total_entries - fresh_entries) as usize,
            total_size_bytes: total_size as usize,
            oldest_entry: oldest.and_then(DateTime::from_timestamp_millis),
            newest_entry: newest.and_then(DateTime::from_timestamp_millis),
        })
    }
}

#[async_trait]
impl TimelineStore for SqliteTimelineStore {
    async fn load_timeline(&self, username: &str) -> crate::error::Result<Option<CachedUserTimeline>> {
        Ok(self.load(username)?)
    }

    async fn save_timeline(&self, timeline: &CachedUserTimeline) -> crate::error::Result<()> {
        Ok(self.save(timeline)?)
    }
}

/// Statistics about cache clear operation
#[derive(Debug)]
pub struct ClearStats {
    pub entries_removed: usize,
}

/// Statistics about cache state
#[derive(Debug)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub stale_entries: usize,
    pub total_size_bytes: usize,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fixtures::timeline;
    use tempfile::TempDir;

    fn test_store() -> (SqliteTimelineStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SqliteTimelineStore::open_at(dir.path()).unwrap();
        (store, dir)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_save_load() {
        let (store, _dir) = test_store();
        let entry = CachedUserTimeline::new("jack", timeline("jack", 3), at(1_700_000_000))
            .with_fetched_count(10);

        store.save(&entry).unwrap();

        let loaded = store.load("@JACK").unwrap().unwrap();
        assert_eq!(loaded, entry);
    }

    #[test]
    fn test_load_missing() {
        let (store, _dir) = test_store();
        assert!(store.load("nobody").unwrap().is_none());
    }

    #[test]
    fn test_save_replaces() {
        let (store, _dir) = test_store();
        store
            .save(&CachedUserTimeline::new("jack", timeline("a", 3), at(1)))
            .unwrap();
        store
            .save(&CachedUserTimeline::new("jack", timeline("b", 1), at(2)))
            .unwrap();

        let loaded = store.load("jack").unwrap().unwrap();
        assert_eq!(loaded.tweets.len(), 1);
        assert_eq!(loaded.updated_at, at(2));
    }

    #[test]
    fn test_clear_all() {
        let (store, _dir) = test_store();
        store
            .save(&CachedUserTimeline::new("a", vec![], at(1)))
            .unwrap();
        store
            .save(&CachedUserTimeline::new("b", vec![], at(1)))
            .unwrap();

        let stats = store.clear_all().unwrap();
        assert_eq!(stats.entries_removed, 2);
        assert!(store.load("a").unwrap().is_none());
    }

    #[test]
    fn test_stats_split_fresh_and_stale() {
        let (store, _dir) = test_store();
        let now = at(1_700_000_000);
        store
            .save(&CachedUserTimeline::new("fresh", timeline("f", 1), now - Duration::hours(1)))
            .unwrap();
        store
            .save(&CachedUserTimeline::new("stale", timeline("s", 1), now - Duration::hours(30)))
            .unwrap();

        let stats = store.stats(now, Duration::hours(24)).unwrap();
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.fresh_entries, 1);
        assert_eq!(stats.stale_entries, 1);
        assert!(stats.total_size_bytes > 0);
        assert_eq!(stats.newest_entry, Some(now - Duration::hours(1)));
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        {
            let store = SqliteTimelineStore::open_at(dir.path()).unwrap();
            store
                .save(&CachedUserTimeline::new("jack", timeline("j", 2), at(5)))
                .unwrap();
        }
        let store = SqliteTimelineStore::open_at(dir.path()).unwrap();
        assert_eq!(store.load("jack").unwrap().unwrap().tweets.len(), 2);
    }

    #[test]
    fn test_old_schema_is_rebuilt() {
        let dir = TempDir::new().unwrap();
        {
            let conn = Connection::open(dir.path().join("cache.db")).unwrap();
            conn.execute_batch(
                "CREATE TABLE timelines (username TEXT PRIMARY KEY, tweets TEXT, updated_at INTEGER, size_bytes INTEGER);
                 INSERT INTO timelines VALUES ('jack', '[]', 0, 2);
                 PRAGMA user_version = 1;",
            )
            .unwrap();
        }

        let store = SqliteTimelineStore::open_at(dir.path()).unwrap();
        assert!(store.load("jack").unwrap().is_none());
        store
            .save(&CachedUserTimeline::new("jack", timeline("j", 1), at(5)).with_fetched_count(5))
            .unwrap();
        assert_eq!(store.load("jack").unwrap().unwrap().fetched_count, 5);
    }
}
