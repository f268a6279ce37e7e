use axum::body::Bytes;
use serde::{Deserialize, Serialize};

/// Metadata returned for one stored file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedFile {
    pub id: String,
    /// Storage filename: `id` followed by the original extension.
    pub name: String,
    /// Content type as declared by the client. Not verified.
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: u64,
    pub url: String,
}

/// A file part buffered from the multipart form, not yet persisted.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl FilePart {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}
