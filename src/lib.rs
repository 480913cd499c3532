//! # stationflow
//!
//! Ingestion/validation/forecast pipeline for an environmental sensor station
//! (temperature, humidity, CO₂ over MQTT-style pub/sub).
//!
//! ## Architecture
//!
//! 1. A transport adapter (external) pushes raw byte payloads into a bounded
//!    mpsc channel
//! 2. The ingestion task validates each payload, overwrites the latest-value
//!    cache, and appends complete readings to the SQLite store
//! 3. Query callers read the store concurrently and run the forecast engine
//!    over a bounded recent window
//!
//! **Key principle:** partial or malformed data degrades, it never errors.
//! A payload with a missing field still refreshes the cache; a malformed
//! payload is dropped with a log line; a series too short or too flat to
//! model yields `None` rather than a failed forecast.
//!
//! ## Module organization
//!
//! - `validator` - raw payload → typed, partially-nullable message
//! - `latest_cache` - most-recently-observed value snapshot
//! - `store` - append-only time-ordered reading store (SQLite)
//! - `ingest` - channel-driven ingestion coordinator task
//! - `forecast` - auto-order ARIMA one-step-ahead forecasting
//! - `query` - read surface consumed by the presentation layer
//! - `control` - sensor reporting-interval command payloads
//! - `config` - environment-based runtime configuration

pub mod config;
pub mod control;
pub mod forecast;
pub mod ingest;
pub mod latest_cache;
pub mod query;
pub mod sqlite_pragma;
pub mod store;
pub mod validator;

// Re-export commonly used types
pub use config::StationConfig;
pub use ingest::{IngestCoordinator, IngestMessage};
pub use latest_cache::{LatestCache, SharedLatest};
pub use query::QuerySurface;
pub use store::{Reading, ReadingStore, SqliteReadingStore, StoreError};
pub use validator::{ValidatedMessage, ValidationError};
