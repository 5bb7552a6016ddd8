//! Species cache coordinator
//!
//! Maps a scientific name to the id of its one canonical master record,
//! creating the record on first sight and bumping `times_identified` on every
//! later resolution. Race safety comes entirely from the store's atomic
//! insert-if-absent; this module holds no locks of its own.

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{canonical_scientific_name, DiagnosisDocument};
use crate::store::{InsertOutcome, NewMasterSpecies, PlantStore};

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("A diagnosis is required to register a new species")]
    MissingDiagnosis,

    #[error("Scientific name is empty")]
    EmptyScientificName,

    #[error("Could not resolve species '{scientific_name}': insert failed ({insert_error}); lookup failed ({fetch_error})")]
    Unresolved {
        scientific_name: String,
        insert_error: String,
        fetch_error: String,
    },
}

/// Outcome of a successful resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub master_id: Uuid,
    /// True when this call created the master record
    pub created: bool,
}

pub struct SpeciesCoordinator {
    store: Arc<dyn PlantStore>,
}

impl SpeciesCoordinator {
    pub fn new(store: Arc<dyn PlantStore>) -> Self {
        Self { store }
    }

    /// Resolve a species to its master id
    ///
    /// With `known_master_id` the counter is bumped best-effort and the id is
    /// returned as-is. Otherwise `diagnosis` seeds a new record; when another
    /// writer got there first, that record's counter is bumped instead.
    pub async fn resolve(
        &self,
        scientific_name: &str,
        known_master_id: Option<Uuid>,
        diagnosis: Option<&DiagnosisDocument>,
        contributor_id: &str,
    ) -> Result<Resolution, CoordinatorError> {
        if let Some(master_id) = known_master_id {
            match self.store.increment_times_identified(master_id).await {
                Ok(count) => {
                    debug!(master_id = %master_id, times_identified = count, "Known species re-identified");
                }
                Err(e) => {
                    warn!(master_id = %master_id, error = %e, "Failed to increment times_identified for known species");
                }
            }
            return Ok(Resolution {
                master_id,
                created: false,
            });
        }

        let diagnosis = diagnosis.ok_or(CoordinatorError::MissingDiagnosis)?;

        let name = canonical_scientific_name(scientific_name);
        if name.is_empty() {
            return Err(CoordinatorError::EmptyScientificName);
        }

        let new = NewMasterSpecies {
            scientific_name: name.clone(),
            common_name: diagnosis.plant_identity.common_name.clone(),
            all_names: diagnosis.all_names_display(),
            botanical_specs: diagnosis.to_value(),
            contributor_id: contributor_id.to_string(),
        };

        match self.store.insert_species_if_absent(&new).await {
            Ok(InsertOutcome::Inserted(record)) => {
                info!(scientific_name = %name, master_id = %record.id, "New master species created");
                Ok(Resolution {
                    master_id: record.id,
                    created: true,
                })
            }
            Ok(InsertOutcome::Conflict) => {
                debug!(scientific_name = %name, "Species already registered, reusing master record");
                self.reuse_existing(&name, None).await
            }
            Err(e) if e.is_unique_violation() => {
                debug!(scientific_name = %name, "Unique violation on insert, reusing master record");
                self.reuse_existing(&name, None).await
            }
            Err(e) => {
                warn!(scientific_name = %name, error = %e, "Master insert failed, falling back to lookup");
                self.reuse_existing(&name, Some(e.to_string())).await
            }
        }
    }

    async fn reuse_existing(
        &self,
        name: &str,
        insert_error: Option<String>,
    ) -> Result<Resolution, CoordinatorError> {
        let unresolved = |fetch_error: String| CoordinatorError::Unresolved {
            scientific_name: name.to_string(),
            insert_error: insert_error
                .clone()
                .unwrap_or_else(|| "conflict on scientific_name".to_string()),
            fetch_error,
        };

        let record = match self.store.find_species_by_name(name).await {
            Ok(Some(record)) => record,
            Ok(None) => return Err(unresolved("no record with this name".to_string())),
            Err(e) => return Err(unresolved(e.to_string())),
        };

        if let Err(e) = self.store.increment_times_identified(record.id).await {
            warn!(master_id = %record.id, error = %e, "Failed to increment times_identified");
        }

        Ok(Resolution {
            master_id: record.id,
            created: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryPlantStore, NewGardenEntry};
    use async_trait::async_trait;
    use serde_json::json;
    use verdant_common::db::{Garden, GardenEntry, MasterSpeciesRecord};
    use verdant_common::{Error, Result};

    fn diagnosis(name: &str, common: &str) -> DiagnosisDocument {
        serde_json::from_value(json!({
            "plant_identity": { "scientific_name": name, "common_name": common },
            "diagnosis": { "health_status": "Healthy" }
        }))
        .unwrap()
    }

    /// Delegates reads, fails every write
    struct ReadOnlyStore {
        inner: MemoryPlantStore,
    }

    #[async_trait]
    impl PlantStore for ReadOnlyStore {
        async fn insert_species_if_absent(&self, _new: &NewMasterSpecies) -> Result<InsertOutcome> {
            Err(Error::Internal("store is read-only".to_string()))
        }

        async fn find_species_by_name(&self, name: &str) -> Result<Option<MasterSpeciesRecord>> {
            self.inner.find_species_by_name(name).await
        }

        async fn get_species(&self, id: Uuid) -> Result<Option<MasterSpeciesRecord>> {
            self.inner.get_species(id).await
        }

        async fn increment_times_identified(&self, _id: Uuid) -> Result<i64> {
            Err(Error::Internal("store is read-only".to_string()))
        }

        async fn insert_garden_entry(&self, _entry: &NewGardenEntry) -> Result<GardenEntry> {
            Err(Error::Internal("store is read-only".to_string()))
        }

        async fn create_garden(&self, _user_id: &str, _name: &str) -> Result<Garden> {
            Err(Error::Internal("store is read-only".to_string()))
        }

        async fn list_gardens(&self, user_id: &str) -> Result<Vec<Garden>> {
            self.inner.list_gardens(user_id).await
        }
    }

    #[tokio::test]
    async fn test_first_sighting_then_known_id() {
        let store = Arc::new(MemoryPlantStore::new());
        let coordinator = SpeciesCoordinator::new(store.clone());
        let doc = diagnosis("Ficus lyrata", "Fiddle-leaf fig");

        let first = coordinator
            .resolve("Ficus lyrata", None, Some(&doc), "user-a")
            .await
            .unwrap();
        assert!(first.created);

        let record = store.get_species(first.master_id).await.unwrap().unwrap();
        assert_eq!(record.times_identified, 1);
        assert_eq!(record.original_contributor_id, "user-a");
        assert_eq!(record.common_name.as_deref(), Some("Fiddle-leaf fig"));

        let second = coordinator
            .resolve("Ficus lyrata", Some(first.master_id), None, "user-b")
            .await
            .unwrap();
        assert_eq!(second.master_id, first.master_id);
        assert!(!second.created);

        let record = store.get_species(first.master_id).await.unwrap().unwrap();
        assert_eq!(record.times_identified, 2);
        assert_eq!(record.original_contributor_id, "user-a");
    }

    #[tokio::test]
    async fn test_sequential_known_id_resolutions_add_one_each() {
        let store = Arc::new(MemoryPlantStore::new());
        let coordinator = SpeciesCoordinator::new(store.clone());
        let doc = diagnosis("Monstera deliciosa", "Swiss cheese plant");

        let created = coordinator
            .resolve("Monstera deliciosa", None, Some(&doc), "u")
            .await
            .unwrap();

        for _ in 0..5 {
            coordinator
                .resolve("Monstera deliciosa", Some(created.master_id), None, "u")
                .await
                .unwrap();
        }

        let record = store.get_species(created.master_id).await.unwrap().unwrap();
        assert_eq!(record.times_identified, 6);
    }

    #[tokio::test]
    async fn test_second_writer_does_not_overwrite_specs() {
        let store = Arc::new(MemoryPlantStore::new());
        let coordinator = SpeciesCoordinator::new(store.clone());

        let first = coordinator
            .resolve("Aloe vera", None, Some(&diagnosis("Aloe vera", "Aloe")), "first")
            .await
            .unwrap();
        let second = coordinator
            .resolve("Aloe vera", None, Some(&diagnosis("Aloe vera", "Burn plant")), "second")
            .await
            .unwrap();

        assert_eq!(first.master_id, second.master_id);
        assert!(first.created);
        assert!(!second.created);

        let record = store.get_species(first.master_id).await.unwrap().unwrap();
        assert_eq!(record.common_name.as_deref(), Some("Aloe"));
        assert_eq!(record.original_contributor_id, "first");
        assert_eq!(record.botanical_specs["plant_identity"]["common_name"], "Aloe");
        assert_eq!(record.times_identified, 2);
    }

    #[tokio::test]
    async fn test_whitespace_variants_share_a_record() {
        let store = Arc::new(MemoryPlantStore::new());
        let coordinator = SpeciesCoordinator::new(store.clone());
        let doc = diagnosis("Ficus lyrata", "Fig");

        let a = coordinator.resolve("Ficus lyrata", None, Some(&doc), "u").await.unwrap();
        let b = coordinator.resolve("  Ficus   lyrata ", None, Some(&doc), "u").await.unwrap();

        assert_eq!(a.master_id, b.master_id);
        assert_eq!(store.species_count().await, 1);
    }

    #[tokio::test]
    async fn test_missing_diagnosis_and_empty_name() {
        let coordinator = SpeciesCoordinator::new(Arc::new(MemoryPlantStore::new()));

        assert!(matches!(
            coordinator.resolve("Ficus lyrata", None, None, "u").await,
            Err(CoordinatorError::MissingDiagnosis)
        ));

        let doc = diagnosis("Ficus lyrata", "Fig");
        assert!(matches!(
            coordinator.resolve("   ", None, Some(&doc), "u").await,
            Err(CoordinatorError::EmptyScientificName)
        ));
    }

    #[tokio::test]
    async fn test_failed_increment_leaves_counter_unchanged() {
        let inner = MemoryPlantStore::new();
        let doc = diagnosis("Ficus lyrata", "Fig");
        let existing = match inner
            .insert_species_if_absent(&NewMasterSpecies {
                scientific_name: "Ficus lyrata".to_string(),
                common_name: Some("Fig".to_string()),
                all_names: None,
                botanical_specs: doc.to_value(),
                contributor_id: "u".to_string(),
            })
            .await
            .unwrap()
        {
            InsertOutcome::Inserted(record) => record,
            InsertOutcome::Conflict => panic!("fresh store reported a conflict"),
        };

        let store = Arc::new(ReadOnlyStore { inner });
        let coordinator = SpeciesCoordinator::new(store.clone());

        // Known id: increment fails, id still returned
        let known = coordinator
            .resolve("Ficus lyrata", Some(existing.id), None, "u")
            .await
            .unwrap();
        assert_eq!(known.master_id, existing.id);

        // Insert fails, fallback lookup finds the record
        let fallback = coordinator
            .resolve("Ficus lyrata", None, Some(&doc), "u")
            .await
            .unwrap();
        assert_eq!(fallback.master_id, existing.id);
        assert!(!fallback.created);

        let record = store.get_species(existing.id).await.unwrap().unwrap();
        assert_eq!(record.times_identified, 1);
    }

    #[tokio::test]
    async fn test_insert_and_lookup_both_failing_is_unresolved() {
        let store = Arc::new(ReadOnlyStore {
            inner: MemoryPlantStore::new(),
        });
        let coordinator = SpeciesCoordinator::new(store);
        let doc = diagnosis("Pilea peperomioides", "Chinese money plant");

        let err = coordinator
            .resolve("Pilea peperomioides", None, Some(&doc), "u")
            .await
            .unwrap_err();

        match err {
            CoordinatorError::Unresolved {
                scientific_name,
                insert_error,
                ..
            } => {
                assert_eq!(scientific_name, "Pilea peperomioides");
                assert!(insert_error.contains("read-only"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_concurrent_first_sightings_converge() {
        let store = Arc::new(MemoryPlantStore::new());
        let coordinator = Arc::new(SpeciesCoordinator::new(store.clone()));
        let doc = diagnosis("Calathea orbifolia", "Prayer plant");

        let mut handles = Vec::new();
        for i in 0..16 {
            let coordinator = coordinator.clone();
            let doc = doc.clone();
            handles.push(tokio::spawn(async move {
                coordinator
                    .resolve("Calathea orbifolia", None, Some(&doc), &format!("user-{i}"))
                    .await
                    .unwrap()
            }));
        }

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        let master_id = results[0].master_id;
        assert!(results.iter().all(|r| r.master_id == master_id));
        assert_eq!(results.iter().filter(|r| r.created).count(), 1);
        assert_eq!(store.species_count().await, 1);

        let record = store.get_species(master_id).await.unwrap().unwrap();
        assert_eq!(record.times_identified, 16);
    }
}
