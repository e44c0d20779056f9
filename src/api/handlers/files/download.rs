use crate::api::error::AppError;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use tokio_util::io::ReaderStream;

use super::types::*;

/// `attachment` disposition naming the file. The plain `filename` carries the
/// name as-is when it is printable ASCII; `filename*` (RFC 5987) always
/// carries the exact UTF-8 name.
pub fn content_disposition(filename: &str) -> String {
    let ascii_filename = filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control() && *c != '"' && *c != '\\')
        .collect::<String>();
    let fallback_filename = if ascii_filename.is_empty() {
        "download"
    } else {
        &ascii_filename
    };

    let encoded_filename = utf8_percent_encode(filename, NON_ALPHANUMERIC).to_string();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback_filename, encoded_filename
    )
}

#[utoipa::path(
    get,
    path = "/download",
    params(DownloadQuery),
    responses(
        (status = 200, description = "Raw file bytes"),
        (status = 400, description = "Missing or invalid file parameter", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    ),
    tag = "files"
)]
pub async fn download_file(
    State(state): State<crate::AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, AppError> {
    let requested = query.file.unwrap_or_default();
    let download = state.downloads.open(&requested).await?;

    let disposition = HeaderValue::from_str(&content_disposition(&download.name))
        .map_err(|_| AppError::BadRequest("File name cannot be sent as a header".to_string()))?;

    // Streamed straight from storage, never buffered whole
    let stream = ReaderStream::with_capacity(download.reader, state.config.chunk_size.max(1));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_DISPOSITION, disposition),
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_LENGTH, HeaderValue::from(download.size)),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
