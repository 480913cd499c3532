//! Control-channel payloads for sensor reconfiguration
//!
//! The station can ask the remote sensor to change its reporting interval by
//! publishing `{"interval": <minutes>}` on the control topic. There is no
//! acknowledgement contract; the only failure this path reports is missing
//! or malformed input. Actual delivery sits behind the `ControlPublisher`
//! seam (the transport adapter implements it).

use async_trait::async_trait;
use serde_json::json;

pub const MIN_INTERVAL_MINUTES: u64 = 1;
pub const MAX_INTERVAL_MINUTES: u64 = 1_440;

#[derive(Debug)]
pub enum ControlError {
    /// Missing, non-integer, or out-of-range interval input
    InvalidInterval(String),
    /// Transport-side publish failure
    Publish(String),
}

impl std::fmt::Display for ControlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlError::InvalidInterval(e) => write!(f, "Invalid interval: {}", e),
            ControlError::Publish(e) => write!(f, "Publish failed: {}", e),
        }
    }
}

impl std::error::Error for ControlError {}

/// Outbound publisher seam implemented by the transport adapter
#[async_trait]
pub trait ControlPublisher: Send + Sync {
    async fn publish(&self, payload: &[u8]) -> Result<(), ControlError>;
}

/// Build the reporting-interval command payload from raw user input
///
/// The input arrives as an optional string (query parameter, CLI argument);
/// missing or malformed input is the one place the read/write surface
/// reports a distinct failure status.
pub fn interval_command(raw: Option<&str>) -> Result<Vec<u8>, ControlError> {
    let raw = raw
        .ok_or_else(|| ControlError::InvalidInterval("interval parameter missing".to_string()))?;

    let minutes: u64 = raw
        .trim()
        .parse()
        .map_err(|_| ControlError::InvalidInterval(format!("not an integer: {:?}", raw)))?;

    if !(MIN_INTERVAL_MINUTES..=MAX_INTERVAL_MINUTES).contains(&minutes) {
        return Err(ControlError::InvalidInterval(format!(
            "{} minutes outside {}..={}",
            minutes, MIN_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES
        )));
    }

    Ok(json!({ "interval": minutes }).to_string().into_bytes())
}

/// Validate the input and publish the command
pub async fn reconfigure_interval(
    publisher: &dyn ControlPublisher,
    raw: Option<&str>,
) -> Result<(), ControlError> {
    let payload = interval_command(raw)?;
    publisher.publish(&payload).await?;
    log::info!("✅ Reporting-interval command published");
    Ok(())
}
