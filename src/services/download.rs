use std::io;
use std::sync::Arc;

use crate::api::error::AppError;
use crate::services::storage::{StorageReader, StorageService};
use crate::utils::validation::validate_stored_name;

/// A stored file opened for streaming back to a client.
pub struct FileDownload {
    /// Name the client asked for, used as the save-as hint
    pub name: String,
    /// Size on disk when the file was opened
    pub size: u64,
    pub reader: StorageReader,
}

pub struct DownloadService {
    storage: Arc<dyn StorageService>,
}

impl DownloadService {
    pub fn new(storage: Arc<dyn StorageService>) -> Self {
        Self { storage }
    }

    /// Opens `requested` by exact name. Invalid names are refused before
    /// storage is consulted.
    pub async fn open(&self, requested: &str) -> Result<FileDownload, AppError> {
        validate_stored_name(requested).map_err(|e| AppError::BadRequest(e.message))?;

        let opened = self
            .storage
            .open_read(requested)
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    AppError::NotFound(format!("File '{}' not found", requested))
                }
                io::ErrorKind::InvalidInput => AppError::BadRequest(e.to_string()),
                _ => {
                    tracing::error!("Failed to open file {}: {}", requested, e);
                    AppError::io("Failed to open file", e)
                }
            })?;

        tracing::info!("Downloading file: {} ({} bytes)", requested, opened.size);

        Ok(FileDownload {
            name: requested.to_string(),
            size: opened.size,
            reader: opened.reader,
        })
    }
}
