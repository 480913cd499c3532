//! Latest-observed value cache
//!
//! Holds the most recently *observed* (not necessarily persisted) value per
//! variable. Every successfully decoded message overwrites all three fields
//! unconditionally, so a field the sensor stopped reporting goes back to the
//! unset state rather than pinning a stale value.
//!
//! Single writer (the ingestion task), any number of snapshot readers.

use crate::validator::ValidatedMessage;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Most-recently-observed value per variable; `None` = unset
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatestCache {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub co2: Option<f64>,
}

/// Shared handle: write side owned by the ingestion task, read side cloned
/// out to query callers
pub type SharedLatest = Arc<RwLock<LatestCache>>;

impl LatestCache {
    /// Overwrite all three fields from a decoded message
    ///
    /// Unconditional by design: the cache mirrors the last transmission,
    /// including its gaps.
    pub fn apply(&mut self, msg: &ValidatedMessage) {
        self.temperature = msg.temperature;
        self.humidity = msg.humidity;
        self.co2 = msg.co2;
    }
}

/// Create a shared cache in the startup (all-unset) state
pub fn shared() -> SharedLatest {
    Arc::new(RwLock::new(LatestCache::default()))
}
