//! Station runtime: ingestion task + periodic query-surface status loop
//!
//! The transport adapter here is a stdin line feed (one JSON payload per
//! line), which is what the replay tooling and local development use; a real
//! MQTT subscriber plugs into the same channel sender.

use stationflow::{
    ingest::{run_ingestion, IngestCoordinator, IngestMessage},
    latest_cache, QuerySurface, SqliteReadingStore, StationConfig,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Write logs to stderr so piped payload tooling keeps stdout clean
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = StationConfig::from_env();

    log::info!("🚀 Starting stationflow...");
    log::info!("📊 Configuration:");
    log::info!("   DB path: {}", config.db_path);
    log::info!("   Broker: {}", config.broker_url);
    log::info!(
        "   Topics: data={} control={}",
        config.data_topic,
        config.control_topic
    );

    let store = match SqliteReadingStore::new(&config.db_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            log::error!("❌ Failed to open reading store: {}", e);
            std::process::exit(1);
        }
    };

    let latest = latest_cache::shared();

    // Bounded inbound queue between the transport adapter and the single
    // ingestion task
    let (tx, rx) = mpsc::channel::<IngestMessage>(config.channel_buffer);

    let coordinator = IngestCoordinator::new(store.clone(), latest.clone());
    let ingest_handle = tokio::spawn(run_ingestion(rx, coordinator));

    // Payload feed: stdin stand-in for the MQTT data-topic subscriber
    let feed_tx = tx.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            if feed_tx
                .send(IngestMessage::Payload(line.into_bytes()))
                .await
                .is_err()
            {
                break;
            }
        }
        log::info!("Payload feed closed");
    });

    let query = QuerySurface::new(store.clone(), latest.clone());
    let mut status_timer = interval(Duration::from_secs(config.status_interval_secs));
    // First tick fires immediately; skip it so startup logs stay readable
    status_timer.tick().await;

    log::info!("✅ Pipeline configured, waiting for readings...");

    loop {
        tokio::select! {
            _ = status_timer.tick() => {
                let current = query.current_values().await;
                let forecasts = query.forecast_all().await;
                log::info!(
                    "📊 Current: t={} h={} co2={} | next: t={} h={} co2={}",
                    fmt(current.temperature),
                    fmt(current.humidity),
                    fmt(current.co2),
                    fmt(forecasts.temperature),
                    fmt(forecasts.humidity),
                    fmt(forecasts.co2),
                );
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Shutdown requested");
                let _ = tx.send(IngestMessage::Shutdown).await;
                break;
            }
        }
    }

    if let Err(e) = ingest_handle.await {
        log::warn!("⚠️  Ingestion task join error: {}", e);
    }
    log::info!("✅ stationflow stopped");
}

/// Display helper: "-" is the unset sentinel, matching the dashboard
fn fmt(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.1}", v))
        .unwrap_or_else(|| "-".to_string())
}
