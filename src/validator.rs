//! Reading validator - normalizes raw inbound payloads
//!
//! The sensor publishes JSON objects like `{"temperature": 20.1,
//! "humidity": 55, "co2": 402}`. Firmware revisions have shipped fields as
//! numbers, as quoted strings, or not at all, so extraction is defensive:
//! a field that is missing or cannot be coerced to a finite float degrades
//! to `None` for that field only. Only a payload that fails to decode as a
//! JSON object is an error.

use serde_json::Value;

/// A decoded sensor message with per-field degradation already applied
///
/// All-`None` is still a valid message: it refreshes the latest-value cache
/// but triggers no store write.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedMessage {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub co2: Option<f64>,
}

impl ValidatedMessage {
    /// True when all three fields are present, i.e. the message is
    /// persistable as a Reading
    pub fn is_complete(&self) -> bool {
        self.temperature.is_some() && self.humidity.is_some() && self.co2.is_some()
    }
}

#[derive(Debug)]
pub enum ValidationError {
    /// Payload was not a decodable JSON object
    ParseFailure(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::ParseFailure(e) => write!(f, "Malformed payload: {}", e),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Decode and normalize one raw inbound payload
///
/// Pure transform: no side effects, nothing throws past this boundary.
pub fn validate(raw: &[u8]) -> Result<ValidatedMessage, ValidationError> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|e| ValidationError::ParseFailure(e.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| ValidationError::ParseFailure("payload is not a JSON object".to_string()))?;

    Ok(ValidatedMessage {
        temperature: coerce_field(object.get("temperature")),
        humidity: coerce_field(object.get("humidity")),
        co2: coerce_field(object.get("co2")),
    })
}

/// Coerce one field to a finite float, degrading to `None` on any failure
fn coerce_field(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        // Some firmware builds quote numeric values
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed.filter(|v| v.is_finite())
}
