//! Ingestion coordinator - wires inbound payloads to validator, cache, and store
//!
//! A single dedicated task consumes a bounded mpsc channel, so messages are
//! handled one at a time in arrival order. The transport adapter (MQTT
//! subscriber, replay tool, test harness) only ever sees the channel sender.
//!
//! Delivery semantics are at-most-once per message: a payload that fails to
//! parse is dropped, and a reading whose store write fails is lost. Both are
//! logged, neither is retried.

use crate::latest_cache::SharedLatest;
use crate::store::ReadingStore;
use crate::validator::{self, ValidatedMessage};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Message sent through the channel from the transport adapter to the
/// ingestion task
#[derive(Debug, Clone)]
pub enum IngestMessage {
    /// One raw inbound payload, exactly as received from the transport
    Payload(Vec<u8>),
    Shutdown,
}

/// Owns the write side of the pipeline: validator → cache → store
pub struct IngestCoordinator {
    store: Arc<dyn ReadingStore>,
    latest: SharedLatest,
}

impl IngestCoordinator {
    pub fn new(store: Arc<dyn ReadingStore>, latest: SharedLatest) -> Self {
        Self { store, latest }
    }

    /// Handle one inbound payload
    ///
    /// Never fails toward the caller: every fault is converted to a dropped
    /// message or a lost reading, with a log line.
    pub async fn on_message(&self, raw: &[u8]) {
        let msg = match validator::validate(raw) {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("⚠️  Dropping inbound message: {}", e);
                return;
            }
        };

        // Cache first: even a partial message is the freshest observation
        {
            let mut latest = self.latest.write().await;
            latest.apply(&msg);
        }

        match msg {
            ValidatedMessage {
                temperature: Some(t),
                humidity: Some(h),
                co2: Some(co2),
            } => {
                if let Err(e) = self.store.append(t, h, co2).await {
                    // At-most-once: the reading is lost, not buffered
                    log::error!("❌ Failed to store reading: {}", e);
                }
            }
            partial => {
                log::debug!(
                    "Partial message (t={:?} h={:?} co2={:?}), cache updated, store skipped",
                    partial.temperature,
                    partial.humidity,
                    partial.co2
                );
            }
        }
    }
}

/// Background task that drains the inbound channel into the coordinator
///
/// Runs until a `Shutdown` message arrives or the channel closes (transport
/// adapter dropped its sender).
pub async fn run_ingestion(
    mut rx: mpsc::Receiver<IngestMessage>,
    coordinator: IngestCoordinator,
) {
    log::info!("🚀 Ingestion task started");

    let mut received = 0u64;
    let mut last_log_time = std::time::Instant::now();

    while let Some(message) = rx.recv().await {
        match message {
            IngestMessage::Payload(raw) => {
                coordinator.on_message(&raw).await;
                received += 1;

                // Log throughput every 60 seconds
                if last_log_time.elapsed().as_secs() >= 60 {
                    log::info!(
                        "📊 Ingestion rate: {:.2} msg/sec (channel: {})",
                        received as f64 / last_log_time.elapsed().as_secs_f64(),
                        rx.len()
                    );
                    received = 0;
                    last_log_time = std::time::Instant::now();
                }
            }
            IngestMessage::Shutdown => {
                log::info!("Ingestion task received shutdown signal");
                break;
            }
        }
    }

    log::info!("✅ Ingestion task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::latest_cache;
    use crate::store::SqliteReadingStore;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_complete_message_stored_and_cached() {
        let dir = tempdir().unwrap();
        let store = Arc::new(SqliteReadingStore::new(dir.path().join("test.db")).unwrap());
        let latest = latest_cache::shared();
        let coordinator = IngestCoordinator::new(store.clone(), latest.clone());

        coordinator
            .on_message(br#"{"temperature": 20.1, "humidity": 55, "co2": 400}"#)
            .await;

        let stored = store.latest().await.unwrap().unwrap();
        assert_eq!(stored.temperature, 20.1);
        assert_eq!(stored.co2, 400.0);

        let cache = latest.read().await;
        assert_eq!(cache.humidity, Some(55.0));
    }

    #[tokio::test]
    async fn test_partial_message_updates_cache_only() {
        let dir = tempdir().unwrap();
        let store = Arc::new(SqliteReadingStore::new(dir.path().join("test.db")).unwrap());
        let latest = latest_cache::shared();
        let coordinator = IngestCoordinator::new(store.clone(), latest.clone());

        // CO₂ missing: temperature/humidity observed, nothing persisted
        coordinator
            .on_message(br#"{"temperature": 20.1, "humidity": 55}"#)
            .await;

        assert_eq!(store.latest().await.unwrap(), None);

        let cache = latest.read().await;
        assert_eq!(cache.temperature, Some(20.1));
        assert_eq!(cache.humidity, Some(55.0));
        assert_eq!(cache.co2, None);
    }

    #[tokio::test]
    async fn test_non_numeric_co2_clears_cache_field() {
        let dir = tempdir().unwrap();
        let store = Arc::new(SqliteReadingStore::new(dir.path().join("test.db")).unwrap());
        let latest = latest_cache::shared();
        let coordinator = IngestCoordinator::new(store.clone(), latest.clone());

        coordinator
            .on_message(br#"{"temperature": 20.0, "humidity": 55, "co2": 400}"#)
            .await;
        coordinator
            .on_message(br#"{"temperature": 20.2, "humidity": 54, "co2": "-"}"#)
            .await;

        // Only the first message reached the store
        assert_eq!(store.recent_window(80).await.unwrap().len(), 1);

        let cache = latest.read().await;
        assert_eq!(cache.temperature, Some(20.2));
        assert_eq!(cache.co2, None);
    }

    #[tokio::test]
    async fn test_malformed_message_leaves_state_unchanged() {
        let dir = tempdir().unwrap();
        let store = Arc::new(SqliteReadingStore::new(dir.path().join("test.db")).unwrap());
        let latest = latest_cache::shared();
        let coordinator = IngestCoordinator::new(store.clone(), latest.clone());

        coordinator.on_message(b"not json at all").await;

        assert_eq!(store.latest().await.unwrap(), None);
        assert_eq!(*latest.read().await, crate::latest_cache::LatestCache::default());
    }

    #[tokio::test]
    async fn test_run_ingestion_drains_channel_and_shuts_down() {
        let dir = tempdir().unwrap();
        let store = Arc::new(SqliteReadingStore::new(dir.path().join("test.db")).unwrap());
        let coordinator = IngestCoordinator::new(store.clone(), latest_cache::shared());

        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(run_ingestion(rx, coordinator));

        for co2 in [400, 405, 402] {
            let payload = format!(r#"{{"temperature": 20.1, "humidity": 55, "co2": {}}}"#, co2);
            tx.send(IngestMessage::Payload(payload.into_bytes()))
                .await
                .unwrap();
        }
        tx.send(IngestMessage::Shutdown).await.unwrap();

        handle.await.unwrap();

        // Channel order preserved: messages handled one at a time
        let window = store.recent_window(80).await.unwrap();
        let co2s: Vec<f64> = window.iter().map(|r| r.co2).collect();
        assert_eq!(co2s, vec![400.0, 405.0, 402.0]);
    }
}
