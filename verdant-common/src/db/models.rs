//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical knowledge-base entry for one scientific name
///
/// `botanical_specs` holds the diagnosis document of the first contributor
/// and is never rewritten; only `times_identified` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterSpeciesRecord {
    pub id: Uuid,
    pub scientific_name: String,
    pub common_name: Option<String>,
    pub all_names: Option<String>,
    pub botanical_specs: serde_json::Value,
    pub times_identified: i64,
    pub original_contributor_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One user's plant inside one garden
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GardenEntry {
    pub id: Uuid,
    pub garden_id: String,
    pub user_id: String,
    pub master_plant_id: Uuid,
    pub nickname: Option<String>,
    pub health_status: Option<String>,
    pub is_in_pot: bool,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Named collection of garden entries owned by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Garden {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
