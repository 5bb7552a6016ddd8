//! Blob store abstraction
//!
//! Opaque key -> bytes storage with URL retrieval. Keys are `/`-separated
//! relative paths; [`validate_key`] rejects anything that could escape the
//! store root.

pub mod fs;
pub mod memory;

pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("Invalid blob key: {0}")]
    InvalidKey(String),

    #[error("Blob not found: {0}")]
    NotFound(String),

    #[error("Blob IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), BlobError>;

    /// URL a client can fetch the blob from
    fn public_url(&self, key: &str) -> String;

    async fn delete(&self, key: &str) -> Result<(), BlobError>;
}

/// Reject empty, absolute, or parent-relative keys
pub fn validate_key(key: &str) -> Result<(), BlobError> {
    let bad_segment = key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\'));
    if key.is_empty() || bad_segment {
        return Err(BlobError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Join a base URL and a key with exactly one `/`
pub(crate) fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}
