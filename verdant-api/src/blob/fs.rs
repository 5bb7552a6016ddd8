//! Filesystem blob store
//!
//! Blobs live under `<root>/blobs/<key>` and are served by the router at
//! `/media/<key>`. Writes go to a temp file first and are renamed into place,
//! so a reader never sees a half-written photo.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use super::{join_url, validate_key, BlobError, BlobStore};

pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<(), BlobError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let temp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&temp_path, bytes).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(key = %key, content_type = %content_type, size = bytes.len(), "Blob written");
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BlobError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_upload_and_delete() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path(), "/media");

        store.upload("u1/photo.jpg", b"jpeg bytes", "image/jpeg").await.unwrap();

        let written = std::fs::read(dir.path().join("u1").join("photo.jpg")).unwrap();
        assert_eq!(written, b"jpeg bytes");
        assert_eq!(store.public_url("u1/photo.jpg"), "/media/u1/photo.jpg");

        store.delete("u1/photo.jpg").await.unwrap();
        assert!(!dir.path().join("u1").join("photo.jpg").exists());
        assert!(matches!(
            store.delete("u1/photo.jpg").await,
            Err(BlobError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path(), "/media");

        store.upload("u1/a.png", b"png", "image/png").await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path().join("u1"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.png".to_string()]);
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let dir = TempDir::new().unwrap();
        let store = FsBlobStore::new(dir.path().join("blobs"), "/media");

        let result = store.upload("../escape.jpg", b"x", "image/jpeg").await;

        assert!(matches!(result, Err(BlobError::InvalidKey(_))));
        assert!(!dir.path().join("escape.jpg").exists());
    }
}
