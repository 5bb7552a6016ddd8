//! Multipart form parsing shared by the photo endpoints

use axum::extract::multipart::{Multipart, MultipartRejection};
use std::collections::HashMap;

use crate::error::{ApiError, ApiResult};
use crate::models::ImageUpload;

/// Name of the file part carrying the photo
pub const IMAGE_FIELD: &str = "image";

/// Parsed multipart body: at most one photo plus text fields
#[derive(Debug, Default)]
pub struct UploadForm {
    pub image: Option<ImageUpload>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Read every part of the body
    ///
    /// A body that is not multipart, or that exceeds the upload limit, is a
    /// validation error. Repeated text fields keep the last value.
    pub async fn read(multipart: Result<Multipart, MultipartRejection>) -> ApiResult<Self> {
        let mut multipart = multipart.map_err(|e| ApiError::Validation(e.body_text()))?;
        let mut form = UploadForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::Validation(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == IMAGE_FIELD {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(e.body_text()))?;
                form.image = Some(ImageUpload {
                    bytes: bytes.to_vec(),
                    content_type,
                    file_name,
                });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::Validation(e.body_text()))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Field value exactly as sent
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Trimmed field value; blank counts as absent
    pub fn text(&self, name: &str) -> Option<&str> {
        self.raw(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Photo, if one was sent with at least one byte
    pub fn photo(&self) -> Option<&ImageUpload> {
        self.image.as_ref().filter(|img| !img.is_empty())
    }

    #[cfg(test)]
    pub(crate) fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }
}
