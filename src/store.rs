//! Append-only, time-ordered reading store (SQLite)
//!
//! One row per complete reading. Append order defines temporal order; rows
//! are never updated or deleted by this crate. Each append and each read is
//! its own atomic unit, so the ingestion task and query readers share the
//! connection safely under WAL mode.

use crate::sqlite_pragma::apply_optimized_pragmas;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// One persisted sensor sample
///
/// All three fields are non-null by construction: partial messages never
/// reach the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub temperature: f64,
    pub humidity: f64,
    pub co2: f64,
    /// Unix seconds, assigned at persistence time; non-decreasing in
    /// insertion order
    pub recorded_at: i64,
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Database(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "IO error: {}", e),
            StoreError::Database(e) => write!(f, "Database error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// Durable backing for validated readings
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Append one complete reading; the store assigns the timestamp.
    ///
    /// Returns the stored Reading. A write failure is reported, not retried:
    /// the in-flight reading is lost (at-most-once semantics).
    async fn append(&self, temperature: f64, humidity: f64, co2: f64)
        -> Result<Reading, StoreError>;

    /// Most recently appended reading, or `None` if the store is empty
    async fn latest(&self) -> Result<Option<Reading>, StoreError>;

    /// Up to `limit` most recently appended readings, oldest first
    ///
    /// Returns fewer than `limit` when fewer exist, empty when empty.
    async fn recent_window(&self, limit: usize) -> Result<Vec<Reading>, StoreError>;
}

/// SQLite implementation of ReadingStore
pub struct SqliteReadingStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteReadingStore {
    /// Open (or create) the database and ensure the schema exists
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;

        // Apply optimized PRAGMAs (WAL, NORMAL, MEMORY, mmap, cache, autocheckpoint)
        apply_optimized_pragmas(&conn)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS readings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                temperature REAL NOT NULL,
                humidity REAL NOT NULL,
                co2 REAL NOT NULL,
                recorded_at INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_recorded_at ON readings(recorded_at DESC)",
            [],
        )?;

        log::info!("✅ Reading store initialized with WAL mode");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

#[async_trait]
impl ReadingStore for SqliteReadingStore {
    async fn append(
        &self,
        temperature: f64,
        humidity: f64,
        co2: f64,
    ) -> Result<Reading, StoreError> {
        let reading = Reading {
            temperature,
            humidity,
            co2,
            recorded_at: Utc::now().timestamp(),
        };

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO readings (temperature, humidity, co2, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                reading.temperature,
                reading.humidity,
                reading.co2,
                reading.recorded_at
            ],
        )?;

        log::debug!(
            "✅ Reading stored: t={:.1} h={:.1} co2={:.0}",
            reading.temperature,
            reading.humidity,
            reading.co2
        );

        Ok(reading)
    }

    async fn latest(&self) -> Result<Option<Reading>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let reading = conn
            .query_row(
                "SELECT temperature, humidity, co2, recorded_at
                 FROM readings ORDER BY id DESC LIMIT 1",
                [],
                |row| {
                    Ok(Reading {
                        temperature: row.get(0)?,
                        humidity: row.get(1)?,
                        co2: row.get(2)?,
                        recorded_at: row.get(3)?,
                    })
                },
            )
            .optional()?;

        Ok(reading)
    }

    async fn recent_window(&self, limit: usize) -> Result<Vec<Reading>, StoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT temperature, humidity, co2, recorded_at
             FROM readings ORDER BY id DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(Reading {
                temperature: row.get(0)?,
                humidity: row.get(1)?,
                co2: row.get(2)?,
                recorded_at: row.get(3)?,
            })
        })?;

        let mut readings = rows.collect::<Result<Vec<_>, _>>()?;
        // Query returns newest-first; callers want ascending time order
        readings.reverse();

        Ok(readings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_append_and_latest() {
        let dir = tempdir().unwrap();
        let store = SqliteReadingStore::new(dir.path().join("test.db")).unwrap();

        assert_eq!(store.latest().await.unwrap(), None);

        store.append(20.1, 55.0, 400.0).await.unwrap();
        let stored = store.append(20.3, 54.0, 405.0).await.unwrap();

        let latest = store.latest().await.unwrap().unwrap();
        assert_eq!(latest, stored);
        assert_eq!(latest.co2, 405.0);
    }

    #[tokio::test]
    async fn test_recent_window_ascending_order() {
        let dir = tempdir().unwrap();
        let store = SqliteReadingStore::new(dir.path().join("test.db")).unwrap();

        for co2 in [400.0, 405.0, 402.0, 410.0] {
            store.append(20.0, 55.0, co2).await.unwrap();
        }

        let window = store.recent_window(3).await.unwrap();
        let co2s: Vec<f64> = window.iter().map(|r| r.co2).collect();

        // Three most recent, oldest first
        assert_eq!(co2s, vec![405.0, 402.0, 410.0]);
    }

    #[tokio::test]
    async fn test_window_larger_than_store() {
        let dir = tempdir().unwrap();
        let store = SqliteReadingStore::new(dir.path().join("test.db")).unwrap();

        for co2 in [400.0, 405.0, 402.0] {
            store.append(20.0, 55.0, co2).await.unwrap();
        }

        let window = store.recent_window(80).await.unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].co2, 400.0);
        assert_eq!(window[2].co2, 402.0);
    }

    #[tokio::test]
    async fn test_empty_window() {
        let dir = tempdir().unwrap();
        let store = SqliteReadingStore::new(dir.path().join("test.db")).unwrap();

        assert!(store.recent_window(80).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timestamps_non_decreasing() {
        let dir = tempdir().unwrap();
        let store = SqliteReadingStore::new(dir.path().join("test.db")).unwrap();

        for _ in 0..5 {
            store.append(20.0, 55.0, 400.0).await.unwrap();
        }

        let window = store.recent_window(80).await.unwrap();
        for pair in window.windows(2) {
            assert!(pair[1].recorded_at >= pair[0].recorded_at);
        }
    }
}
