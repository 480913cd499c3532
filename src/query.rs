//! Query surface consumed by the presentation layer
//!
//! Three independent, idempotent, side-effect-free reads: current values
//! (short poll), history (medium poll), forecasts (long poll). Read-side
//! operations never surface an error: a store fault degrades to an empty
//! history or an unset field, with a log line, so the presentation layer
//! always receives a well-formed response.

use crate::forecast;
use crate::latest_cache::SharedLatest;
use crate::store::{Reading, ReadingStore};
use chrono::DateTime;
use serde::Serialize;
use std::sync::Arc;

/// History poll depth (readings)
pub const HISTORY_WINDOW: usize = 30;

/// Forecast input depth (readings)
pub const FORECAST_WINDOW: usize = 80;

/// Most recent observation per variable; `None` = nothing observed yet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentValues {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub co2: Option<f64>,
}

/// One history row, display-ready
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub temperature: f64,
    pub humidity: f64,
    pub co2: f64,
    pub recorded_at: String,
}

/// One-step-ahead forecast per variable; `None` = insufficient or unusable
/// data for that variable only
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableForecasts {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub co2: Option<f64>,
}

pub struct QuerySurface {
    store: Arc<dyn ReadingStore>,
    latest: SharedLatest,
}

impl QuerySurface {
    pub fn new(store: Arc<dyn ReadingStore>, latest: SharedLatest) -> Self {
        Self { store, latest }
    }

    /// Latest observed value per variable
    ///
    /// Cache first; fields the cache has not observed fall back to the most
    /// recent stored reading (covers a restart with an empty cache but a
    /// populated store).
    pub async fn current_values(&self) -> CurrentValues {
        let snapshot = self.latest.read().await.clone();

        let mut current = CurrentValues {
            temperature: snapshot.temperature,
            humidity: snapshot.humidity,
            co2: snapshot.co2,
        };

        if current.temperature.is_some() && current.humidity.is_some() && current.co2.is_some() {
            return current;
        }

        match self.store.latest().await {
            Ok(Some(reading)) => {
                current.temperature = current.temperature.or(Some(reading.temperature));
                current.humidity = current.humidity.or(Some(reading.humidity));
                current.co2 = current.co2.or(Some(reading.co2));
            }
            Ok(None) => {}
            Err(e) => log::warn!("⚠️  Latest-reading fallback failed: {}", e),
        }

        current
    }

    /// The most recent stored readings, oldest first, display-formatted
    pub async fn history(&self) -> Vec<HistoryEntry> {
        let readings = match self.store.recent_window(HISTORY_WINDOW).await {
            Ok(readings) => readings,
            Err(e) => {
                log::warn!("⚠️  History read failed: {}", e);
                return Vec::new();
            }
        };

        readings
            .iter()
            .map(|r| HistoryEntry {
                temperature: r.temperature,
                humidity: r.humidity,
                co2: r.co2,
                recorded_at: format_timestamp(r.recorded_at),
            })
            .collect()
    }

    /// One-step-ahead forecast for each variable, independently
    ///
    /// A failed or unavailable forecast for one variable never blocks the
    /// others.
    pub async fn forecast_all(&self) -> VariableForecasts {
        let window = match self.store.recent_window(FORECAST_WINDOW).await {
            Ok(window) => window,
            Err(e) => {
                log::warn!("⚠️  Forecast window read failed: {}", e);
                Vec::new()
            }
        };

        VariableForecasts {
            temperature: forecast::forecast_next(&field_series(&window, |r| r.temperature)),
            humidity: forecast::forecast_next(&field_series(&window, |r| r.humidity)),
            co2: forecast::forecast_next(&field_series(&window, |r| r.co2)),
        }
    }
}

fn field_series(window: &[Reading], field: fn(&Reading) -> f64) -> Vec<Option<f64>> {
    window.iter().map(|r| Some(field(r))).collect()
}

fn format_timestamp(unix_secs: i64) -> String {
    match DateTime::from_timestamp(unix_secs, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => unix_secs.to_string(),
    }
}
