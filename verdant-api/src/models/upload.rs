//! Uploaded photo

/// Photo bytes plus what the client claimed about them
#[derive(Debug, Clone, Default)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    /// Content type from the multipart part header
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

impl ImageUpload {
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            content_type,
            file_name: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// MIME type sniffed from the bytes, else the declared one
    pub fn mime_type(&self) -> String {
        if let Some(kind) = infer::get(&self.bytes) {
            return kind.mime_type().to_string();
        }
        self.content_type
            .as_deref()
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or("application/octet-stream")
            .to_string()
    }

    /// File extension matching [`Self::mime_type`]
    ///
    /// Falls back to the uploaded file name, then `bin`.
    pub fn extension(&self) -> &'static str {
        if let Some(kind) = infer::get(&self.bytes) {
            return kind.extension();
        }
        let declared = match self.content_type.as_deref().map(str::trim) {
            Some("image/jpeg") | Some("image/jpg") => Some("jpg"),
            Some("image/png") => Some("png"),
            Some("image/webp") => Some("webp"),
            Some("image/heic") => Some("heic"),
            Some("image/gif") => Some("gif"),
            _ => None,
        };
        declared
            .or_else(|| self.file_name.as_deref().and_then(known_extension))
            .unwrap_or("bin")
    }
}

fn known_extension(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.trim().rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("jpg"),
        "png" => Some("png"),
        "webp" => Some("webp"),
        "heic" => Some("heic"),
        "gif" => Some("gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

    #[test]
    fn test_sniffed_type_wins_over_declared() {
        let upload = ImageUpload::new(PNG_HEADER.to_vec(), Some("image/jpeg".to_string()));
        assert_eq!(upload.mime_type(), "image/png");
        assert_eq!(upload.extension(), "png");
    }

    #[test]
    fn test_declared_type_used_when_unrecognized() {
        let upload = ImageUpload::new(b"not really a jpeg".to_vec(), Some("image/jpeg".to_string()));
        assert_eq!(upload.mime_type(), "image/jpeg");
        assert_eq!(upload.extension(), "jpg");
    }

    #[test]
    fn test_unknown_everything() {
        let upload = ImageUpload::new(b"???".to_vec(), None);
        assert_eq!(upload.mime_type(), "application/octet-stream");
        assert_eq!(upload.extension(), "bin");
    }

    #[test]
    fn test_file_name_used_when_type_unknown() {
        let mut upload = ImageUpload::new(b"???".to_vec(), Some("application/octet-stream".to_string()));
        upload.file_name = Some("leaf.PNG".to_string());
        assert_eq!(upload.extension(), "png");

        upload.file_name = Some("notes.txt".to_string());
        assert_eq!(upload.extension(), "bin");
    }
}
