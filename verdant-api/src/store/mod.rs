//! Relational store abstraction
//!
//! The species coordinator and garden writer only see [`PlantStore`]. Two
//! backends implement it: SQLite ([`SqlitePlantStore`]) and a process-local
//! map ([`MemoryPlantStore`]) used for mock deployments and tests.
//!
//! Every write is a single atomic operation at the store; there are no
//! multi-statement transactions.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryPlantStore;
pub use sqlite::SqlitePlantStore;

use async_trait::async_trait;
use uuid::Uuid;
use verdant_common::db::{Garden, GardenEntry, MasterSpeciesRecord};
use verdant_common::Result;

/// Fields of a master record supplied by its first contributor
#[derive(Debug, Clone)]
pub struct NewMasterSpecies {
    pub scientific_name: String,
    pub common_name: Option<String>,
    pub all_names: Option<String>,
    pub botanical_specs: serde_json::Value,
    pub contributor_id: String,
}

/// Fields of a garden entry at creation
#[derive(Debug, Clone)]
pub struct NewGardenEntry {
    pub garden_id: String,
    pub user_id: String,
    pub master_plant_id: Uuid,
    pub nickname: Option<String>,
    pub health_status: Option<String>,
    pub is_in_pot: bool,
    pub photo_url: Option<String>,
}

/// Result of an insert-if-absent on the species key
#[derive(Debug, Clone)]
pub enum InsertOutcome {
    /// This call created the record
    Inserted(MasterSpeciesRecord),
    /// A record with the same scientific name already existed
    Conflict,
}

#[async_trait]
pub trait PlantStore: Send + Sync {
    /// Insert with `times_identified = 1` unless the scientific name exists
    ///
    /// Must be one atomic operation (e.g. `INSERT ... ON CONFLICT DO NOTHING`).
    async fn insert_species_if_absent(&self, new: &NewMasterSpecies) -> Result<InsertOutcome>;

    async fn find_species_by_name(&self, scientific_name: &str)
        -> Result<Option<MasterSpeciesRecord>>;

    async fn get_species(&self, id: Uuid) -> Result<Option<MasterSpeciesRecord>>;

    /// Add exactly one to `times_identified`, returning the new value
    ///
    /// `Error::NotFound` when no record has this id.
    async fn increment_times_identified(&self, id: Uuid) -> Result<i64>;

    async fn insert_garden_entry(&self, entry: &NewGardenEntry) -> Result<GardenEntry>;

    async fn create_garden(&self, user_id: &str, name: &str) -> Result<Garden>;

    async fn list_gardens(&self, user_id: &str) -> Result<Vec<Garden>>;
}
