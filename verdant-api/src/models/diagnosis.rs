//! Diagnosis document
//!
//! The shape the inference service is asked to produce. Only the fields the
//! service acts on are typed; everything else the model returns is kept in
//! the `extra` maps so the full document survives into `botanical_specs`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Value stored when the model omits `treatment_protocol`
pub const DEFAULT_TREATMENT_PROTOCOL: &str = "not required";

/// Plant health as reported by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Sick,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Sick => "Sick",
            HealthStatus::Critical => "Critical",
        }
    }

    /// Case-insensitive match against the three accepted labels
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "healthy" => Some(HealthStatus::Healthy),
            "sick" => Some(HealthStatus::Sick),
            "critical" => Some(HealthStatus::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantIdentity {
    pub scientific_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    /// String or list of strings, depending on the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_names: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub health_status: HealthStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Validated output of the diagnosis normalizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisDocument {
    pub plant_identity: PlantIdentity,
    pub diagnosis: Diagnosis,
    #[serde(default = "default_treatment_protocol")]
    pub treatment_protocol: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_treatment_protocol() -> Value {
    Value::String(DEFAULT_TREATMENT_PROTOCOL.to_string())
}

impl DiagnosisDocument {
    pub fn scientific_name(&self) -> &str {
        &self.plant_identity.scientific_name
    }

    pub fn health_status(&self) -> HealthStatus {
        self.diagnosis.health_status
    }

    /// Display name for a new garden entry: common name, else scientific name
    pub fn nickname(&self) -> String {
        self.plant_identity
            .common_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.plant_identity.scientific_name)
            .to_string()
    }

    /// `all_names` flattened to one display string
    pub fn all_names_display(&self) -> Option<String> {
        let joined = match self.plant_identity.all_names.as_ref()? {
            Value::String(s) => s.trim().to_string(),
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            _ => return None,
        };
        (!joined.is_empty()).then_some(joined)
    }

    /// Whole document as JSON, for `botanical_specs`
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Canonical form of a species key: trimmed, inner whitespace runs collapsed
///
/// Matching stays case-sensitive; "Ficus lyrata" and "ficus lyrata" are
/// different keys.
pub fn canonical_scientific_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}
