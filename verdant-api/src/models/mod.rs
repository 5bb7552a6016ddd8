//! Data models for verdant-api
//!
//! - Diagnosis documents produced by the inference service
//! - Uploaded photos travelling from the HTTP layer to the blob store

pub mod diagnosis;
pub mod upload;

pub use diagnosis::{
    canonical_scientific_name, Diagnosis, DiagnosisDocument, HealthStatus, PlantIdentity,
    DEFAULT_TREATMENT_PROTOCOL,
};
pub use upload::ImageUpload;
