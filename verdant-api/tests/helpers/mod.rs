//! Shared fixtures for verdant-api integration tests

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use verdant_api::blob::MemoryBlobStore;
use verdant_api::services::MockInference;
use verdant_api::store::MemoryPlantStore;
use verdant_api::AppState;

pub const BOUNDARY: &str = "verdant-test-boundary";

/// Smallest byte string `infer` recognizes as JPEG
pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];

pub const FICUS_DIAGNOSIS: &str = r#"{
    "plant_identity": {
        "scientific_name": "Ficus lyrata",
        "common_name": "Fiddle-leaf fig",
        "all_names": ["Fiddle-leaf fig", "Banjo fig"]
    },
    "diagnosis": { "health_status": "Sick", "observations": "brown spots" },
    "treatment_protocol": { "steps": ["Reduce watering"] }
}"#;

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

/// Encode parts as a multipart/form-data body using [`BOUNDARY`]
pub fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, content_type, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"plant.jpg\"\r\n\
                         Content-Type: {}\r\n\r\n",
                        name, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, parts: &[Part]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, json: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

/// Helper to extract JSON from response body
pub async fn extract_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn extract_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

/// In-memory collaborators, kept so tests can inspect them
pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryPlantStore>,
    pub blobs: Arc<MemoryBlobStore>,
}

pub fn memory_app() -> TestApp {
    memory_app_with(MockInference::default())
}

pub fn memory_app_with(inference: MockInference) -> TestApp {
    let store = Arc::new(MemoryPlantStore::new());
    let blobs = Arc::new(MemoryBlobStore::default());
    let state = AppState::new(store.clone(), blobs.clone(), Arc::new(inference), "tester");
    TestApp {
        state,
        store,
        blobs,
    }
}
