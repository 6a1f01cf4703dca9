use chrono::{DateTime, SecondsFormat, Utc};
use moviebot_models::{MovieId, UserId, WatchlistEntry};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::debug;

/// Most entries `list` returns for one user
pub const WATCHLIST_LIMIT: usize = 50;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("watchlist database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("watchlist database I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("movie id {0} does not fit the watchlist table")]
    InvalidKey(MovieId),
    #[error("stored timestamp {0:?} is not RFC 3339")]
    InvalidTimestamp(String),
}

/// Durable per-user watchlist keyed by `(user_id, movie_id)`.
///
/// Every method is one atomic statement; failures propagate to the caller.
pub trait WatchlistStore: Send + Sync {
    /// Insert or replace, stamping `added_at` with the current time
    fn add(&self, user_id: UserId, movie_id: MovieId, title: &str, year: &str) -> Result<(), StorageError>;
    /// Delete if present; absent rows are not an error
    fn remove(&self, user_id: UserId, movie_id: MovieId) -> Result<(), StorageError>;
    /// Newest first, at most `WATCHLIST_LIMIT` entries
    fn list(&self, user_id: UserId) -> Result<Vec<WatchlistEntry>, StorageError>;
}

pub struct SqliteWatchlistStore {
    conn: Mutex<Connection>,
}

impl SqliteWatchlistStore {
    pub fn open(db_path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        let store = Self { conn: Mutex::new(conn) };
        store.init_schema()?;
        debug!(path = %db_path.display(), "Opened watchlist database");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn: Mutex::new(conn) };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        // Every statement is self-contained, so a poisoned lock still guards a consistent connection
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        self.conn().execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS watchlist (
                user_id INTEGER NOT NULL,
                movie_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                year TEXT NOT NULL DEFAULT '',
                added_at TEXT NOT NULL,
                PRIMARY KEY (user_id, movie_id)
            );

            CREATE INDEX IF NOT EXISTS idx_watchlist_user_added ON watchlist(user_id, added_at DESC);
            "#,
        )?;
        Ok(())
    }

    /// Insert or replace a fully specified entry
    pub fn upsert(&self, entry: &WatchlistEntry) -> Result<(), StorageError> {
        let movie_id = i64::try_from(entry.movie_id).map_err(|_| StorageError::InvalidKey(entry.movie_id))?;
        // Fixed-width UTC timestamps sort lexically in time order
        let added_at = entry.added_at.to_rfc3339_opts(SecondsFormat::Nanos, true);

        self.conn().execute(
            r#"
            INSERT INTO watchlist (user_id, movie_id, title, year, added_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id, movie_id) DO UPDATE SET
                title = excluded.title,
                year = excluded.year,
                added_at = excluded.added_at
            "#,
            params![entry.user_id, movie_id, entry.title, entry.year, added_at],
        )?;
        Ok(())
    }

    pub fn count(&self, user_id: UserId) -> Result<usize, StorageError> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM watchlist WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn parse_added_at(raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::InvalidTimestamp(raw.to_string()))
}

impl WatchlistStore for SqliteWatchlistStore {
    fn add(&self, user_id: UserId, movie_id: MovieId, title: &str, year: &str) -> Result<(), StorageError> {
        self.upsert(&WatchlistEntry {
            user_id,
            movie_id,
            title: title.to_string(),
            year: year.to_string(),
            added_at: Utc::now(),
        })
    }

    fn remove(&self, user_id: UserId, movie_id: MovieId) -> Result<(), StorageError> {
        let Ok(movie_id) = i64::try_from(movie_id) else {
            // Such a row can never have been written
            return Ok(());
        };
        let removed = self.conn().execute(
            "DELETE FROM watchlist WHERE user_id = ?1 AND movie_id = ?2",
            params![user_id, movie_id],
        )?;
        debug!(user_id = user_id, movie_id = movie_id, removed = removed, "Watchlist remove");
        Ok(())
    }

    fn list(&self, user_id: UserId) -> Result<Vec<WatchlistEntry>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            r#"
            SELECT movie_id, title, year, added_at
            FROM watchlist
            WHERE user_id = ?1
            ORDER BY added_at DESC, movie_id DESC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt.query_map(params![user_id, WATCHLIST_LIMIT as i64], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (movie_id, title, year, added_at) = row?;
            entries.push(WatchlistEntry {
                user_id,
                movie_id: movie_id as MovieId,
                title,
                year,
                added_at: parse_added_at(&added_at)?,
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(user_id: UserId, movie_id: MovieId, title: &str, added_at: DateTime<Utc>) -> WatchlistEntry {
        WatchlistEntry {
            user_id,
            movie_id,
            title: title.to_string(),
            year: "2014".to_string(),
            added_at,
        }
    }

    #[test]
    fn test_add_then_list() {
        let store = SqliteWatchlistStore::open_in_memory().unwrap();
        store.add(1, 157336, "Interstellar", "2014").unwrap();

        let entries = store.list(1).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].movie_id, 157336);
        assert_eq!(entries[0].title, "Interstellar");
        assert_eq!(entries[0].year, "2014");
        assert_eq!(entries[0].user_id, 1);
    }

    #[test]
    fn test_re_add_replaces_row() {
        let store = SqliteWatchlistStore::open_in_memory().unwrap();
        let first = Utc::now() - Duration::hours(1);
        store.upsert(&entry(1, 157336, "Movie", first)).unwrap();

        store.add(1, 157336, "Interstellar", "2014").unwrap();

        let entries = store.list(1).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Interstellar");
        assert!(entries[0].added_at > first);
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let store = SqliteWatchlistStore::open_in_memory().unwrap();
        store.add(1, 27205, "Inception", "2010").unwrap();

        store.remove(1, 157336).unwrap();
        store.remove(2, 27205).unwrap();
        store.remove(1, u64::MAX).unwrap();

        assert_eq!(store.list(1).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_deletes_only_that_key() {
        let store = SqliteWatchlistStore::open_in_memory().unwrap();
        store.add(1, 27205, "Inception", "2010").unwrap();
        store.add(1, 157336, "Interstellar", "2014").unwrap();
        store.add(2, 157336, "Interstellar", "2014").unwrap();

        store.remove(1, 157336).unwrap();

        let user1 = store.list(1).unwrap();
        assert_eq!(user1.len(), 1);
        assert_eq!(user1[0].movie_id, 27205);
        assert_eq!(store.list(2).unwrap().len(), 1);
    }

    #[test]
    fn test_list_is_newest_first_and_capped() {
        let store = SqliteWatchlistStore::open_in_memory().unwrap();
        let base = Utc::now() - Duration::days(1);
        for i in 0..60u64 {
            store
                .upsert(&entry(9, i + 1, &format!("Movie {}", i + 1), base + Duration::seconds(i as i64)))
                .unwrap();
        }

        let entries = store.list(9).unwrap();
        assert_eq!(entries.len(), WATCHLIST_LIMIT);
        assert_eq!(entries[0].movie_id, 60);
        assert!(entries.windows(2).all(|w| w[0].added_at >= w[1].added_at));
        assert_eq!(store.count(9).unwrap(), 60);
    }

    #[test]
    fn test_oversized_movie_id_is_rejected() {
        let store = SqliteWatchlistStore::open_in_memory().unwrap();
        let err = store.add(1, u64::MAX, "Overflow", "").unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("moviebot.db");
        {
            let store = SqliteWatchlistStore::open(&path).unwrap();
            store.add(3, 603, "The Matrix", "1999").unwrap();
        }
        let reopened = SqliteWatchlistStore::open(&path).unwrap();
        let entries = reopened.list(3).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].label(), "The Matrix (1999)");
    }
}
