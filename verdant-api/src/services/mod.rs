//! Service modules for the plant diagnosis pipeline
//!
//! - `normalizer`: model output -> validated diagnosis document
//! - `inference` / `gemini_client`: photo + prompt -> model output
//! - `species_coordinator`: scientific name -> canonical master record
//! - `garden_writer`: photo + ids -> garden entry

pub mod gemini_client;
pub mod garden_writer;
pub mod inference;
pub mod normalizer;
pub mod species_coordinator;

pub use gemini_client::GeminiClient;
pub use garden_writer::{validate_request, GardenEntryWriter, SaveEntry, SaveStep, WriterError};
pub use inference::{build_diagnosis_prompt, InferenceError, InferenceService, MockInference};
pub use normalizer::{normalize, NormalizationError};
pub use species_coordinator::{CoordinatorError, Resolution, SpeciesCoordinator};
