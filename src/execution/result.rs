//! Response envelopes decoded from helper output.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::GowershellError;
use crate::output::extract_json_blobs;

/// Result of one request, as reported by the helper or synthesized locally
/// when the exchange failed.
///
/// Envelopes are immutable; `blobs` is computed from `output` once, at
/// construction.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResponseEnvelope {
    output: Option<String>,
    error: Option<String>,
    duration_ms: Option<u64>,
    debug: Option<String>,
    blobs: Vec<Value>,
}

/// Response line as sent by the helper.
#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    output: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, deserialize_with = "lenient_millis")]
    duration_ms: Option<u64>,
    #[serde(default)]
    debug: Option<String>,
}

/// Accept any non-negative JSON number, rounding fractional milliseconds.
fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Option::<serde_json::Number>::deserialize(deserializer)?;
    match number {
        None => Ok(None),
        Some(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f.round() as u64)
            })
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid duration_ms: {n}"))),
    }
}

impl ResponseEnvelope {
    /// Create an envelope from its raw fields.
    pub fn new(
        output: Option<String>,
        error: Option<String>,
        duration_ms: Option<u64>,
        debug: Option<String>,
    ) -> Self {
        let blobs = output.as_deref().map(extract_json_blobs).unwrap_or_default();
        Self {
            output,
            error,
            duration_ms,
            debug,
            blobs,
        }
    }

    /// Create an envelope carrying only an error message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(None, Some(message.into()), None, None)
    }

    /// Envelope reported when no response arrived in time.
    pub fn timed_out(command: &str) -> Self {
        Self::failure(format!("Command timed out: {command}"))
    }

    /// Envelope reported when sending or receiving failed.
    pub fn from_error(command: &str, err: &GowershellError) -> Self {
        match err {
            GowershellError::Timeout(_) => Self::timed_out(command),
            other => Self::failure(format!("Failed to execute command: {other}")),
        }
    }

    /// Decode one protocol line.
    ///
    /// The line must be a JSON object. Missing fields are treated as absent
    /// and unknown fields are ignored.
    pub fn from_line(line: &str) -> crate::Result<Self> {
        let value: Value = serde_json::from_str(line.trim())?;
        if !value.is_object() {
            return Err(GowershellError::Protocol(format!(
                "expected a JSON object, got {}",
                json_type_name(&value)
            )));
        }

        let wire: WireResponse = serde_json::from_value(value)
            .map_err(|e| GowershellError::Protocol(e.to_string()))?;

        Ok(Self::new(
            wire.output,
            wire.error,
            wire.duration_ms,
            wire.debug,
        ))
    }

    /// Command output, if any.
    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// Error message, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Execution time reported by the helper, in milliseconds.
    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    /// Debug text reported by verbose requests.
    pub fn debug(&self) -> Option<&str> {
        self.debug.as_deref()
    }

    /// JSON objects embedded in the output, in order of appearance.
    pub fn blobs(&self) -> &[Value] {
        &self.blobs
    }

    /// True unless an error message is present and non-empty.
    pub fn success(&self) -> bool {
        self.error.as_deref().map_or(true, str::is_empty)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
