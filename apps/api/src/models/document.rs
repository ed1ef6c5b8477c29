use bytes::Bytes;
use serde::Serialize;

/// Opaque handle to a rendered document. The bytes never appear in snapshots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentHandle {
    pub filename: String,
    pub content_type: String,
    pub size_bytes: usize,
    #[serde(skip)]
    pub bytes: Bytes,
}

impl DocumentHandle {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            size_bytes: bytes.len(),
            bytes,
        }
    }
}
