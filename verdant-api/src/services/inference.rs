//! Inference service abstraction
//!
//! Given a photo and a text prompt, an [`InferenceService`] returns free text
//! that is expected to contain a diagnosis JSON document. Parsing that text
//! is the normalizer's job, not the backend's.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::ImageUpload;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Inference request timed out after {0} seconds")]
    Timeout(u64),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Inference response contained no text")]
    EmptyResponse,

    #[error("Parse error: {0}")]
    Parse(String),
}

#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Model identifier, for logging
    fn model(&self) -> &str;

    async fn generate(&self, prompt: &str, image: &ImageUpload) -> Result<String, InferenceError>;
}

/// Prompt asking for the diagnosis document shape
///
/// `context` is the user's free-text note about the plant (location, recent
/// care, what worries them).
pub fn build_diagnosis_prompt(context: Option<&str>) -> String {
    let mut prompt = String::from(
        "You are a botanist. Identify the plant in the photo and assess its health.\n\
         Reply with a single JSON object and nothing else, using this shape:\n\
         {\n\
           \"plant_identity\": {\"scientific_name\": string, \"common_name\": string, \"all_names\": [string]},\n\
           \"diagnosis\": {\"health_status\": \"Healthy\" | \"Sick\" | \"Critical\", \"observations\": string},\n\
           \"treatment_protocol\": {\"steps\": [string]} or \"not required\"\n\
         }\n",
    );

    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str("Context from the owner: ");
        prompt.push_str(context);
        prompt.push('\n');
    }

    prompt
}

/// Returns a fixed response without contacting any service
pub struct MockInference {
    response: String,
}

impl MockInference {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

impl Default for MockInference {
    fn default() -> Self {
        Self::new(
            "```json\n\
             {\"plant_identity\": {\"scientific_name\": \"Spathiphyllum wallisii\", \
             \"common_name\": \"Peace lily\", \"all_names\": [\"Peace lily\", \"White sails\"]}, \
             \"diagnosis\": {\"health_status\": \"Healthy\", \"observations\": \"Mock diagnosis\"}}\n\
             ```",
        )
    }
}

#[async_trait]
impl InferenceService for MockInference {
    fn model(&self) -> &str {
        "mock"
    }

    async fn generate(&self, _prompt: &str, _image: &ImageUpload) -> Result<String, InferenceError> {
        Ok(self.response.clone())
    }
}
