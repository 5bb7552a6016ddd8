//! Garden entry writer
//!
//! Stores the photo, then records the plant in the user's garden. If the row
//! insert fails after the upload succeeded, the blob is deleted again so no
//! unreferenced photo is left behind.

use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;
use verdant_common::db::GardenEntry;

use crate::blob::{BlobError, BlobStore};
use crate::models::{DiagnosisDocument, ImageUpload};
use crate::store::{NewGardenEntry, PlantStore};

/// Stage of the save pipeline, reported to clients on failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStep {
    MasterResolution,
    ImageUpload,
    GardenInsert,
}

impl SaveStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveStep::MasterResolution => "master_resolution",
            SaveStep::ImageUpload => "image_upload",
            SaveStep::GardenInsert => "garden_insert",
        }
    }
}

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("{0}")]
    Validation(String),

    #[error("Photo upload failed for '{key}': {source}")]
    Upload {
        key: String,
        #[source]
        source: BlobError,
    },

    #[error("Garden entry insert failed: {source}")]
    Persistence {
        key: String,
        #[source]
        source: verdant_common::Error,
        /// Whether the compensating blob delete succeeded
        blob_removed: bool,
    },
}

impl WriterError {
    /// Pipeline step that failed; `None` for validation errors
    pub fn step(&self) -> Option<SaveStep> {
        match self {
            WriterError::Validation(_) => None,
            WriterError::Upload { .. } => Some(SaveStep::ImageUpload),
            WriterError::Persistence { .. } => Some(SaveStep::GardenInsert),
        }
    }
}

/// Everything needed to record one plant
#[derive(Debug, Clone)]
pub struct SaveEntry {
    pub garden_id: String,
    pub user_id: String,
    pub master_id: Uuid,
    pub is_in_pot: bool,
    pub photo: ImageUpload,
    pub diagnosis: Option<DiagnosisDocument>,
}

/// Checks that need no I/O; run before any side effect of a save
pub fn validate_request(garden_id: &str, photo: Option<&ImageUpload>) -> Result<(), WriterError> {
    if garden_id.trim().is_empty() {
        return Err(WriterError::Validation("gardenId is required".to_string()));
    }
    match photo {
        Some(photo) if !photo.is_empty() => Ok(()),
        _ => Err(WriterError::Validation("An image is required".to_string())),
    }
}

/// Blob key for a user's photo: `{user}/{unix_millis}-{uuid}.{ext}`
pub fn photo_key(user_id: &str, extension: &str) -> String {
    let user: String = user_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let user = if user.is_empty() { "anonymous".to_string() } else { user };

    format!(
        "{}/{}-{}.{}",
        user,
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        extension
    )
}

pub struct GardenEntryWriter {
    store: Arc<dyn PlantStore>,
    blobs: Arc<dyn BlobStore>,
}

impl GardenEntryWriter {
    pub fn new(store: Arc<dyn PlantStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    pub async fn save(&self, entry: SaveEntry) -> Result<GardenEntry, WriterError> {
        validate_request(&entry.garden_id, Some(&entry.photo))?;

        let key = photo_key(&entry.user_id, entry.photo.extension());
        let content_type = entry.photo.mime_type();

        self.blobs
            .upload(&key, &entry.photo.bytes, &content_type)
            .await
            .map_err(|source| WriterError::Upload {
                key: key.clone(),
                source,
            })?;
        let photo_url = self.blobs.public_url(&key);

        let new = NewGardenEntry {
            garden_id: entry.garden_id.trim().to_string(),
            user_id: entry.user_id,
            master_plant_id: entry.master_id,
            nickname: entry.diagnosis.as_ref().map(DiagnosisDocument::nickname),
            health_status: entry
                .diagnosis
                .as_ref()
                .map(|d| d.health_status().as_str().to_string()),
            is_in_pot: entry.is_in_pot,
            photo_url: Some(photo_url),
        };

        match self.store.insert_garden_entry(&new).await {
            Ok(saved) => {
                info!(
                    entry_id = %saved.id,
                    garden_id = %saved.garden_id,
                    master_id = %saved.master_plant_id,
                    "Garden entry saved"
                );
                Ok(saved)
            }
            Err(source) => {
                warn!(key = %key, error = %source, "Garden insert failed, removing uploaded photo");
                let blob_removed = match self.blobs.delete(&key).await {
                    Ok(()) => true,
                    Err(e) => {
                        error!(key = %key, error = %e, "Failed to remove orphaned photo");
                        false
                    }
                };
                Err(WriterError::Persistence {
                    key,
                    source,
                    blob_removed,
                })
            }
        }
    }
}
