//! Diagnosis normalizer
//!
//! Turns raw inference output into a validated [`DiagnosisDocument`].
//!
//! Accepted input, in order of attempts:
//! 1. The whole trimmed text as strict JSON
//! 2. The text inside the first fenced code block (```` ```json ... ``` ````)
//! 3. The outermost `{ ... }` span of the fenced body, then of the whole
//!    text, which drops leading/trailing prose around an object
//!
//! Anything else is a [`NormalizationError`]. The inference service is never
//! re-invoked from here.

use serde_json::Value;
use thiserror::Error;

use crate::models::{
    canonical_scientific_name, DiagnosisDocument, HealthStatus, DEFAULT_TREATMENT_PROTOCOL,
};

/// Inference output that could not be turned into a diagnosis
#[derive(Debug, Error)]
#[error("Diagnosis normalization failed: {reason}")]
pub struct NormalizationError {
    pub reason: String,
    /// Unmodified input, kept for diagnostic logging
    pub raw: String,
}

impl NormalizationError {
    fn new(reason: impl Into<String>, raw: &str) -> Self {
        Self {
            reason: reason.into(),
            raw: raw.to_string(),
        }
    }
}

/// Parse and validate raw inference output
pub fn normalize(raw: &str) -> Result<DiagnosisDocument, NormalizationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NormalizationError::new("response is empty", raw));
    }

    let mut value = parse_lenient(trimmed).map_err(|reason| NormalizationError::new(reason, raw))?;

    validate_shape(&mut value).map_err(|reason| NormalizationError::new(reason, raw))?;

    serde_json::from_value(value)
        .map_err(|e| NormalizationError::new(format!("unexpected document shape: {}", e), raw))
}

/// Whole text, then fenced body, then outermost object of either
///
/// Backticks inside JSON strings never count as a fence, since fences are
/// only looked for once the text fails to parse as it stands.
fn parse_lenient(trimmed: &str) -> Result<Value, String> {
    let strict_err = match serde_json::from_str(trimmed) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let fenced = strip_code_fences(trimmed);
    if fenced.is_empty() {
        return Err("response is empty".to_string());
    }

    [Some(fenced), outermost_object(fenced), outermost_object(trimmed)]
        .into_iter()
        .flatten()
        .filter(|text| *text != trimmed)
        .find_map(|text| serde_json::from_str(text).ok())
        .ok_or_else(|| format!("response is not valid JSON: {}", strict_err))
}

/// Content of the first fenced block, or the trimmed text if unfenced
fn strip_code_fences(trimmed: &str) -> &str {
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };

    // Skip the info string ("json", "JSON", ...) right after the opening fence
    let after_open = &trimmed[open + 3..];
    let info_len = after_open
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after_open.len());
    let body = &after_open[info_len..];

    match body.find("```") {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Check required fields and canonicalize them in place
fn validate_shape(value: &mut Value) -> Result<(), String> {
    let root = value
        .as_object_mut()
        .ok_or_else(|| "top-level value is not an object".to_string())?;

    let identity = root
        .get_mut("plant_identity")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| "missing plant_identity object".to_string())?;
    let scientific_name = identity
        .get("scientific_name")
        .and_then(Value::as_str)
        .map(canonical_scientific_name)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| "plant_identity.scientific_name must be a non-empty string".to_string())?;
    identity.insert("scientific_name".to_string(), Value::String(scientific_name));

    let diagnosis = root
        .get_mut("diagnosis")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| "missing diagnosis object".to_string())?;
    let status = diagnosis
        .get("health_status")
        .and_then(Value::as_str)
        .and_then(HealthStatus::parse)
        .ok_or_else(|| {
            "diagnosis.health_status must be one of Healthy, Sick, Critical".to_string()
        })?;
    diagnosis.insert(
        "health_status".to_string(),
        Value::String(status.as_str().to_string()),
    );

    match root.get("treatment_protocol") {
        None | Some(Value::Null) => {
            root.insert(
                "treatment_protocol".to_string(),
                Value::String(DEFAULT_TREATMENT_PROTOCOL.to_string()),
            );
        }
        Some(_) => {}
    }

    Ok(())
}
