//! Process-local [`PlantStore`]
//!
//! Backs the `memory` storage backend and unit tests. One lock guards all
//! maps, so insert-if-absent and increment are atomic within the process.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;
use verdant_common::db::{Garden, GardenEntry, MasterSpeciesRecord};
use verdant_common::{Error, Result};

use super::{InsertOutcome, NewGardenEntry, NewMasterSpecies, PlantStore};

#[derive(Default)]
struct MemoryState {
    species: HashMap<Uuid, MasterSpeciesRecord>,
    species_by_name: HashMap<String, Uuid>,
    entries: Vec<GardenEntry>,
    gardens: Vec<Garden>,
}

#[derive(Default)]
pub struct MemoryPlantStore {
    state: RwLock<MemoryState>,
}

impl MemoryPlantStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn species_count(&self) -> usize {
        self.state.read().await.species.len()
    }

    pub async fn entries(&self) -> Vec<GardenEntry> {
        self.state.read().await.entries.clone()
    }
}

#[async_trait]
impl PlantStore for MemoryPlantStore {
    async fn insert_species_if_absent(&self, new: &NewMasterSpecies) -> Result<InsertOutcome> {
        let mut state = self.state.write().await;

        if state.species_by_name.contains_key(&new.scientific_name) {
            return Ok(InsertOutcome::Conflict);
        }

        let now = Utc::now();
        let record = MasterSpeciesRecord {
            id: Uuid::new_v4(),
            scientific_name: new.scientific_name.clone(),
            common_name: new.common_name.clone(),
            all_names: new.all_names.clone(),
            botanical_specs: new.botanical_specs.clone(),
            times_identified: 1,
            original_contributor_id: new.contributor_id.clone(),
            created_at: now,
            updated_at: now,
        };
        state
            .species_by_name
            .insert(record.scientific_name.clone(), record.id);
        state.species.insert(record.id, record.clone());

        Ok(InsertOutcome::Inserted(record))
    }

    async fn find_species_by_name(
        &self,
        scientific_name: &str,
    ) -> Result<Option<MasterSpeciesRecord>> {
        let state = self.state.read().await;
        Ok(state
            .species_by_name
            .get(scientific_name)
            .and_then(|id| state.species.get(id))
            .cloned())
    }

    async fn get_species(&self, id: Uuid) -> Result<Option<MasterSpeciesRecord>> {
        Ok(self.state.read().await.species.get(&id).cloned())
    }

    async fn increment_times_identified(&self, id: Uuid) -> Result<i64> {
        let mut state = self.state.write().await;
        let record = state
            .species
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("master plant {}", id)))?;
        record.times_identified += 1;
        record.updated_at = Utc::now();
        Ok(record.times_identified)
    }

    async fn insert_garden_entry(&self, new: &NewGardenEntry) -> Result<GardenEntry> {
        let mut state = self.state.write().await;

        // Same guarantee as the SQLite foreign key
        if !state.species.contains_key(&new.master_plant_id) {
            return Err(Error::InvalidInput(format!(
                "master plant {} does not exist",
                new.master_plant_id
            )));
        }

        let entry = GardenEntry {
            id: Uuid::new_v4(),
            garden_id: new.garden_id.clone(),
            user_id: new.user_id.clone(),
            master_plant_id: new.master_plant_id,
            nickname: new.nickname.clone(),
            health_status: new.health_status.clone(),
            is_in_pot: new.is_in_pot,
            photo_url: new.photo_url.clone(),
            created_at: Utc::now(),
        };
        state.entries.push(entry.clone());
        Ok(entry)
    }

    async fn create_garden(&self, user_id: &str, name: &str) -> Result<Garden> {
        let garden = Garden {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.state.write().await.gardens.push(garden.clone());
        Ok(garden)
    }

    async fn list_gardens(&self, user_id: &str) -> Result<Vec<Garden>> {
        Ok(self
            .state
            .read()
            .await
            .gardens
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }
}
