//! Runtime configuration from environment variables

use std::env;

/// Configuration for the station runtime
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct StationConfig {
    /// Path to SQLite database file
    pub db_path: String,

    /// Channel buffer size for inbound payloads (messages)
    pub channel_buffer: usize,

    /// MQTT broker URL (consumed by the transport adapter, not the core)
    pub broker_url: String,

    /// Topic the sensor publishes readings on
    pub data_topic: String,

    /// Topic the station publishes reporting-interval commands on
    pub control_topic: String,

    /// How often the runtime logs a query-surface status snapshot (seconds)
    pub status_interval_secs: u64,
}

impl StationConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `STATION_DB_PATH` (default: /var/lib/stationflow/readings.db)
    /// - `SENSOR_CHANNEL_BUFFER` (default: 1000)
    /// - `MQTT_BROKER_URL` (default: mqtt://broker.emqx.io:1883)
    /// - `MQTT_DATA_TOPIC` (default: iot/esp32/data)
    /// - `MQTT_CONTROL_TOPIC` (default: iot/esp32/config)
    /// - `STATUS_INTERVAL_SECS` (default: 30)
    pub fn from_env() -> Self {
        Self {
            db_path: env::var("STATION_DB_PATH")
                .unwrap_or_else(|_| "/var/lib/stationflow/readings.db".to_string()),

            channel_buffer: env::var("SENSOR_CHANNEL_BUFFER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1_000),

            broker_url: env::var("MQTT_BROKER_URL")
                .unwrap_or_else(|_| "mqtt://broker.emqx.io:1883".to_string()),

            data_topic: env::var("MQTT_DATA_TOPIC")
                .unwrap_or_else(|_| "iot/esp32/data".to_string()),

            control_topic: env::var("MQTT_CONTROL_TOPIC")
                .unwrap_or_else(|_| "iot/esp32/config".to_string()),

            status_interval_secs: env::var("STATUS_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}
