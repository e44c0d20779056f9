use crate::api::error::AppError;
use crate::models::StoredFile;
use crate::utils::validation::sanitize_filename;
use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode, header},
    response::Redirect,
};
use futures::TryStreamExt;
use tokio_util::io::StreamReader;

use super::types::*;

/// Size a client announced for one part, via the part's own `Content-Length`.
fn declared_part_size(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data", description = "File upload"),
    responses(
        (status = 303, description = "All files stored, redirect to the listing"),
        (status = 400, description = "Malformed form or file name", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    tag = "files"
)]
pub async fn upload_file(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    // Files are stored one after another; the first failure stops the request.
    let result: Result<Vec<StoredFile>, AppError> = async {
        let mut stored = Vec::new();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::PayloadTooLarge(
                    "Request body exceeds the maximum allowed limit".to_string(),
                )
            } else {
                AppError::BadRequest(format!("Failed to parse multipart form: {}", e.body_text()))
            }
        })? {
            if field.name() != Some(FILE_FIELD) {
                continue;
            }

            let original_filename = field.file_name().unwrap_or_default().to_string();
            let filename = sanitize_filename(&original_filename)
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            let declared_size = declared_part_size(field.headers());

            tracing::info!(
                "Upload request: File: {}, Size: {:?} bytes",
                filename,
                declared_size
            );

            let body_with_io_error = field.map_err(std::io::Error::other);
            let reader = StreamReader::new(body_with_io_error);

            let file = state.uploads.ingest(&filename, declared_size, reader).await?;
            if file.was_renamed(&filename) {
                tracing::info!("Name collision: {} stored as {}", filename, file.name);
            }
            stored.push(file);
        }

        if stored.is_empty() {
            return Err(AppError::BadRequest("No file provided".to_string()));
        }

        Ok::<_, AppError>(stored)
    }
    .await;

    match result {
        Ok(files) => {
            tracing::info!("Stored {} file(s) in one request", files.len());
            Ok(Redirect::to("/"))
        }
        Err(e) => {
            // Read the rest of the body so the client sees the error instead of a reset
            tracing::warn!("Upload failed: {}. Consuming remaining stream...", e);
            while let Ok(Some(mut field)) = multipart.next_field().await {
                while let Ok(Some(_)) = field.chunk().await {}
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_declared_part_size() {
        let mut headers = HeaderMap::new();
        assert_eq!(declared_part_size(&headers), None);

        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("1234"));
        assert_eq!(declared_part_size(&headers), Some(1234));

        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("lots"));
        assert_eq!(declared_part_size(&headers), None);
    }
}
