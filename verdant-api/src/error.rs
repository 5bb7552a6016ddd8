//! Error types for verdant-api
//!
//! Component errors convert into [`ApiError`], which owns the HTTP mapping.
//! Every failure body carries `error` (summary) and `details` (the upstream
//! message); save failures also carry `transaction_id` and `step_failed`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::{
    CoordinatorError, InferenceError, NormalizationError, SaveStep, WriterError,
};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    Validation(String),

    /// Model output could not be parsed (500)
    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    /// Inference backend failed (500)
    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    #[error(transparent)]
    Writer(#[from] WriterError),

    /// Relational store error (500)
    #[error("Store error: {0}")]
    Store(#[from] verdant_common::Error),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// JSON body of every failure response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_failed: Option<&'static str>,
    /// Model output that failed to parse
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl ErrorBody {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
            transaction_id: None,
            step_failed: None,
            raw_response: None,
        }
    }

    fn with_step(mut self, step: SaveStep) -> Self {
        self.step_failed = Some(step.as_str());
        self
    }
}

impl ApiError {
    /// Status code and body for this error
    pub fn to_parts(&self) -> (StatusCode, ErrorBody) {
        match self {
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("Invalid request", msg.clone()),
            ),
            ApiError::Normalization(e) => {
                let mut body = ErrorBody::new("Failed to interpret diagnosis", e.reason.clone());
                body.raw_response = Some(e.raw.clone());
                (StatusCode::INTERNAL_SERVER_ERROR, body)
            }
            ApiError::Inference(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Failed to analyze plant", e.to_string()),
            ),
            ApiError::Coordinator(e @ CoordinatorError::MissingDiagnosis)
            | ApiError::Coordinator(e @ CoordinatorError::EmptyScientificName) => (
                StatusCode::BAD_REQUEST,
                ErrorBody::new("Invalid request", e.to_string()),
            ),
            ApiError::Coordinator(e @ CoordinatorError::Unresolved { .. }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Failed to resolve species", e.to_string())
                    .with_step(SaveStep::MasterResolution),
            ),
            ApiError::Writer(e) => match e.step() {
                None => (
                    StatusCode::BAD_REQUEST,
                    ErrorBody::new("Invalid request", e.to_string()),
                ),
                Some(step) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new("Failed to save plant", e.to_string()).with_step(step),
                ),
            },
            ApiError::Store(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Database error", e.to_string()),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Internal server error", msg.clone()),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_parts();
        (status, Json(body)).into_response()
    }
}

/// Failure of `POST /plants/save`, tagged with its transaction id
#[derive(Debug)]
pub struct SaveFailure {
    pub transaction_id: String,
    pub error: ApiError,
}

impl SaveFailure {
    pub fn new(transaction_id: &str, error: impl Into<ApiError>) -> Self {
        Self {
            transaction_id: transaction_id.to_string(),
            error: error.into(),
        }
    }
}

impl IntoResponse for SaveFailure {
    fn into_response(self) -> Response {
        let (status, mut body) = self.error.to_parts();
        body.transaction_id = Some(self.transaction_id);
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_400_without_step() {
        let (status, body) = ApiError::Validation("gardenId is required".to_string()).to_parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.details, "gardenId is required");
        assert!(body.step_failed.is_none());
    }

    #[test]
    fn test_unresolved_species_reports_master_resolution() {
        let err = ApiError::from(CoordinatorError::Unresolved {
            scientific_name: "Ficus lyrata".to_string(),
            insert_error: "disk full".to_string(),
            fetch_error: "disk full".to_string(),
        });
        let (status, body) = err.to_parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.step_failed, Some("master_resolution"));
    }

    #[test]
    fn test_missing_diagnosis_is_client_error() {
        let (status, _) = ApiError::from(CoordinatorError::MissingDiagnosis).to_parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_normalization_keeps_raw_text() {
        let err = crate::services::normalize("not json at all").unwrap_err();
        let (status, body) = ApiError::from(err).to_parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.raw_response.as_deref(), Some("not json at all"));
    }
}
