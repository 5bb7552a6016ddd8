//! SQLite-backed [`PlantStore`]

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;
use verdant_common::db::{Garden, GardenEntry, MasterSpeciesRecord};
use verdant_common::Result;

use super::{InsertOutcome, NewGardenEntry, NewMasterSpecies, PlantStore};
use crate::db;

#[derive(Clone)]
pub struct SqlitePlantStore {
    pool: SqlitePool,
}

impl SqlitePlantStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl PlantStore for SqlitePlantStore {
    async fn insert_species_if_absent(&self, new: &NewMasterSpecies) -> Result<InsertOutcome> {
        Ok(match db::master_plants::insert_if_absent(&self.pool, new).await? {
            Some(record) => InsertOutcome::Inserted(record),
            None => InsertOutcome::Conflict,
        })
    }

    async fn find_species_by_name(
        &self,
        scientific_name: &str,
    ) -> Result<Option<MasterSpeciesRecord>> {
        db::master_plants::load_by_scientific_name(&self.pool, scientific_name).await
    }

    async fn get_species(&self, id: Uuid) -> Result<Option<MasterSpeciesRecord>> {
        db::master_plants::load_by_id(&self.pool, id).await
    }

    async fn increment_times_identified(&self, id: Uuid) -> Result<i64> {
        db::master_plants::increment_times_identified(&self.pool, id).await
    }

    async fn insert_garden_entry(&self, entry: &NewGardenEntry) -> Result<GardenEntry> {
        db::garden_entries::insert_entry(&self.pool, entry).await
    }

    async fn create_garden(&self, user_id: &str, name: &str) -> Result<Garden> {
        db::gardens::create_garden(&self.pool, user_id, name).await
    }

    async fn list_gardens(&self, user_id: &str) -> Result<Vec<Garden>> {
        db::gardens::list_by_user(&self.pool, user_id).await
    }
}
