//! Plant endpoints: lookup, analyze, save

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;
use verdant_common::db::GardenEntry;

use super::form::UploadForm;
use crate::error::{ApiError, ApiResult, SaveFailure};
use crate::models::{canonical_scientific_name, DiagnosisDocument};
use crate::services::{build_diagnosis_prompt, normalize, validate_request, SaveEntry};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub scientific_name: Option<String>,
}

/// Response for `POST /plants/save`
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub message: String,
    pub plant: GardenEntry,
}

/// GET /plants/lookup?scientific_name=...
///
/// **Response:** `{"found": true, "data": {...}}` or `{"found": false}`
///
/// Read-only: looking a species up never touches `times_identified`.
pub async fn lookup_plant(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> ApiResult<Json<Value>> {
    let name = query
        .scientific_name
        .as_deref()
        .map(canonical_scientific_name)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::Validation("scientific_name is required".to_string()))?;

    match state.store.find_species_by_name(&name).await? {
        Some(record) => Ok(Json(json!({ "found": true, "data": record }))),
        None => Ok(Json(json!({ "found": false }))),
    }
}

/// POST /plants/analyze (multipart: `image`, optional `context`)
///
/// **Errors:**
/// - 400 Bad Request: no image
/// - 500 Internal Server Error: inference failure or unparseable model output
pub async fn analyze_plant(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<DiagnosisDocument>> {
    let form = UploadForm::read(multipart).await?;
    let photo = form
        .photo()
        .ok_or_else(|| ApiError::Validation("An image is required".to_string()))?;

    let prompt = build_diagnosis_prompt(form.text("context"));
    info!(
        model = %state.inference.model(),
        image_bytes = photo.bytes.len(),
        "Analyzing plant photo"
    );

    let raw = state.inference.generate(&prompt, photo).await.map_err(|e| {
        error!(error = %e, "Inference call failed");
        ApiError::from(e)
    })?;

    let document = normalize(&raw).map_err(|e| {
        error!(reason = %e.reason, raw_response = %e.raw, "Could not normalize model output");
        ApiError::from(e)
    })?;

    info!(
        scientific_name = %document.scientific_name(),
        health_status = %document.health_status(),
        "Plant analyzed"
    );
    Ok(Json(document))
}

/// POST /plants/save
///
/// **Request (multipart):** `image`, `gardenId`, `is_in_pot`, `ai_diagnosis`,
/// optional `master_plant_id`, optional `user_id`
///
/// **Behavior:**
/// 1. Validate garden id and photo (no I/O before this passes)
/// 2. Resolve the species to its master record
/// 3. Upload the photo and insert the garden entry
///
/// **Errors:** every failure body carries `transaction_id`; 500s also carry
/// `step_failed`.
pub async fn save_plant(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<SaveResponse>), SaveFailure> {
    let transaction_id = format!("SAVE-{}", Utc::now().timestamp_millis());

    let result = save_inner(&state, &transaction_id, multipart).await;
    match result {
        Ok(entry) => {
            info!(transaction_id = %transaction_id, entry_id = %entry.id, "Plant saved");
            Ok((
                StatusCode::CREATED,
                Json(SaveResponse {
                    message: "Plant saved".to_string(),
                    plant: entry,
                }),
            ))
        }
        Err(e) => {
            let (status, _) = e.to_parts();
            if status.is_client_error() {
                warn!(transaction_id = %transaction_id, error = %e, "Save rejected");
            } else {
                error!(transaction_id = %transaction_id, error = %e, "Save failed");
            }
            Err(SaveFailure::new(&transaction_id, e))
        }
    }
}

async fn save_inner(
    state: &AppState,
    transaction_id: &str,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<GardenEntry> {
    let mut form = UploadForm::read(multipart).await?;

    let garden_id = form.text("gardenId").unwrap_or_default().to_string();
    validate_request(&garden_id, form.photo())?;

    let is_in_pot = form.raw("is_in_pot") == Some("true");
    let user_id = form
        .text("user_id")
        .unwrap_or(state.default_user_id.as_str())
        .to_string();

    let known_master_id = form
        .text("master_plant_id")
        .map(|id| {
            Uuid::parse_str(id)
                .map_err(|_| ApiError::Validation(format!("Invalid master_plant_id: {}", id)))
        })
        .transpose()?;

    let diagnosis = form
        .text("ai_diagnosis")
        .map(|raw| {
            normalize(raw).map_err(|e| {
                ApiError::Validation(format!("ai_diagnosis is not a valid diagnosis: {}", e.reason))
            })
        })
        .transpose()?;

    let scientific_name = diagnosis
        .as_ref()
        .map(|d| d.scientific_name().to_string())
        .unwrap_or_default();

    info!(
        transaction_id = %transaction_id,
        garden_id = %garden_id,
        scientific_name = %scientific_name,
        known_master = known_master_id.is_some(),
        "Saving plant"
    );

    let resolution = state
        .coordinator()
        .resolve(&scientific_name, known_master_id, diagnosis.as_ref(), &user_id)
        .await?;

    info!(
        transaction_id = %transaction_id,
        master_id = %resolution.master_id,
        created = resolution.created,
        "Species resolved"
    );

    let photo = form.image.take().unwrap_or_default();
    let entry = state
        .writer()
        .save(SaveEntry {
            garden_id,
            user_id,
            master_id: resolution.master_id,
            is_in_pot,
            photo,
            diagnosis,
        })
        .await?;

    Ok(entry)
}

/// Build plant routes
pub fn plant_routes() -> Router<AppState> {
    Router::new()
        .route("/plants/lookup", get(lookup_plant))
        .route("/plants/analyze", post(analyze_plant))
        .route("/plants/save", post(save_plant))
}
