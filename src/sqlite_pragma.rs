//! Optimized SQLite PRAGMAs for the reading store
//!
//! WAL mode lets the single ingestion writer and concurrent query readers
//! coexist without blocking each other; the remaining pragmas trade a little
//! durability-on-power-loss for write throughput, which is acceptable for
//! sensor telemetry.

use rusqlite::Connection;

/// Apply the standard pragma set (WAL, NORMAL, MEMORY, mmap, cache,
/// autocheckpoint) to a freshly opened connection
pub fn apply_optimized_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "mmap_size", 268_435_456i64)?;
    conn.pragma_update(None, "cache_size", -64_000i64)?;
    conn.pragma_update(None, "wal_autocheckpoint", 1_000i64)?;
    Ok(())
}
