//! User garden endpoints

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GardensQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGardenRequest {
    /// Defaults to the configured default user
    pub user_id: Option<String>,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct GardenSummary {
    pub id: Uuid,
    pub name: String,
}

/// GET /user/gardens?user_id=...
pub async fn list_gardens(
    State(state): State<AppState>,
    Query(query): Query<GardensQuery>,
) -> ApiResult<Json<Vec<GardenSummary>>> {
    let user_id = query
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::Validation("user_id is required".to_string()))?;

    let gardens = state.store.list_gardens(user_id).await?;

    Ok(Json(
        gardens
            .into_iter()
            .map(|g| GardenSummary {
                id: g.id,
                name: g.name,
            })
            .collect(),
    ))
}

/// POST /user/gardens
///
/// **Request:** `{"user_id": "...", "name": "Balcony"}`
/// **Response:** 201 `{"id": "...", "name": "Balcony"}`
pub async fn create_garden(
    State(state): State<AppState>,
    payload: Result<Json<CreateGardenRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<GardenSummary>)> {
    let Json(request) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("Garden name cannot be empty".to_string()));
    }
    let user_id = request
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(state.default_user_id.as_str());

    let garden = state.store.create_garden(user_id, name).await?;
    info!(garden_id = %garden.id, user_id = %user_id, "Garden created");

    Ok((
        StatusCode::CREATED,
        Json(GardenSummary {
            id: garden.id,
            name: garden.name,
        }),
    ))
}

/// Build garden routes
pub fn garden_routes() -> Router<AppState> {
    Router::new().route("/user/gardens", get(list_gardens).post(create_garden))
}
