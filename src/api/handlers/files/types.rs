use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::services::storage::StoredEntry;

/// Multipart field carrying uploaded files
pub const FILE_FIELD: &str = "file";

#[derive(Deserialize, IntoParams)]
pub struct DownloadQuery {
    /// Exact name of the stored file
    pub file: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct FileListResponse {
    pub files: Vec<StoredEntry>,
}

/// Shape of the `POST /upload` form, for documentation only.
#[derive(ToSchema)]
pub struct UploadForm {
    /// One or more files, each sent as its own part named `file`
    #[schema(value_type = Vec<String>, format = Binary)]
    pub file: Vec<Vec<u8>>,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
