use crate::api::error::AppError;
use axum::{Json, extract::State};

use super::types::*;

#[utoipa::path(
    get,
    path = "/files",
    responses(
        (status = 200, description = "Every stored file, sorted by name", body = FileListResponse),
        (status = 500, description = "Storage directory unreadable", body = ErrorResponse)
    ),
    tag = "files"
)]
pub async fn list_files(
    State(state): State<crate::AppState>,
) -> Result<Json<FileListResponse>, AppError> {
    let files = state
        .storage
        .list()
        .await
        .map_err(|e| AppError::io("Failed to read upload directory", e))?;

    Ok(Json(FileListResponse { files }))
}
