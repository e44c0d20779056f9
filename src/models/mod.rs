use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A file persisted in the storage directory by an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoredFile {
    /// Final name in storage, after collision resolution
    pub name: String,
    /// Bytes actually written
    pub size: u64,
    /// MIME type sniffed from the leading bytes, when recognised
    pub content_type: Option<String>,
}

impl StoredFile {
    pub fn was_renamed(&self, requested: &str) -> bool {
        self.name != requested
    }
}
