use std::collections::HashSet;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::api::error::AppError;
use crate::config::TransferConfig;
use crate::models::StoredFile;
use crate::services::name_resolver;
use crate::services::progress::{LogProgress, ProgressObserver, ProgressWriter, TransferProgress};
use crate::services::storage::{StorageService, StorageWriter};
use crate::utils::validation::validate_file_size;

/// Persists uploaded files into storage under collision-free names.
pub struct UploadService {
    storage: Arc<dyn StorageService>,
    config: TransferConfig,
}

impl UploadService {
    pub fn new(storage: Arc<dyn StorageService>, config: TransferConfig) -> Self {
        Self { storage, config }
    }

    /// Ingests one file, logging progress through `tracing`.
    pub async fn ingest<R>(
        &self,
        filename: &str,
        declared_size: Option<u64>,
        reader: R,
    ) -> Result<StoredFile, AppError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let observer = Arc::new(LogProgress::new(filename));
        self.ingest_observed(filename, declared_size, reader, observer)
            .await
    }

    /// Ingests one file, reporting progress to `observer`.
    ///
    /// A declared size over the limit is refused before anything is read.
    /// Without a declared size the limit is enforced while copying, and the
    /// partial file is removed so an oversized upload never stays in storage.
    /// Any other failure after creation leaves the partial file in place.
    pub async fn ingest_observed<R>(
        &self,
        filename: &str,
        declared_size: Option<u64>,
        mut reader: R,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<StoredFile, AppError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let max = self.config.max_upload_size;

        // 1. Size gate on the client's declaration
        if let Some(size) = declared_size {
            validate_file_size(size, max).map_err(|e| {
                tracing::warn!("Rejected upload {}: {}", filename, e);
                AppError::PayloadTooLarge(format!(
                    "The uploaded file is too big: {}. Please use a file of at most {} bytes",
                    filename, max
                ))
            })?;
        }

        // 2. Probe leading bytes for sniffing, then put them back in front of the stream
        let header = probe(&mut reader, self.config.probe_size)
            .await
            .map_err(|e| AppError::io("Failed to read uploaded file", e))?;
        let content_type = infer::get(&header).map(|t| t.mime_type().to_string());
        let mut reader = AsyncReadExt::chain(io::Cursor::new(header), reader);

        // 3. Storage directory on demand
        self.storage
            .ensure_root()
            .await
            .map_err(|e| AppError::io("Failed to create upload directory", e))?;

        // 4. + 5. Resolve a name and claim it exclusively
        let (name, file) = self.claim_name(filename).await?;

        tracing::info!(
            "Receiving {} (declared size: {:?}, type: {})",
            name,
            declared_size,
            content_type.as_deref().unwrap_or("unknown")
        );

        let progress = TransferProgress::new(declared_size);
        let mut writer = ProgressWriter::new(file, progress.clone(), observer);
        let mut buffer = vec![0u8; self.config.chunk_size.max(1)];

        loop {
            let n = reader.read(&mut buffer).await.map_err(|e| {
                tracing::error!(
                    "Upload stream for {} failed after {} bytes: {}",
                    name,
                    progress.bytes_transferred(),
                    e
                );
                AppError::io("Failed to read upload stream", e)
            })?;
            if n == 0 {
                break;
            }

            if progress.bytes_transferred() + n as u64 > max {
                drop(writer);
                self.discard_oversized(&name).await;
                return Err(AppError::PayloadTooLarge(format!(
                    "The uploaded file is too big: {}. Please use a file of at most {} bytes",
                    filename, max
                )));
            }

            writer
                .write_all(&buffer[..n])
                .await
                .map_err(|e| AppError::io("Failed to write file", e))?;
        }

        writer
            .shutdown()
            .await
            .map_err(|e| AppError::io("Failed to write file", e))?;

        let size = progress.bytes_transferred();
        if let Some(declared) = progress.total_size().filter(|d| *d != size) {
            tracing::warn!(
                "Upload {} declared {} bytes but sent {}",
                name,
                declared,
                size
            );
        }

        tracing::info!("File {} uploaded successfully as {} ({} bytes)", filename, name, size);

        Ok(StoredFile {
            name,
            size,
            content_type,
        })
    }

    /// Lists storage, picks a free name and creates it exclusively. A lost
    /// race marks the name as taken and resolves again.
    async fn claim_name(&self, desired: &str) -> Result<(String, StorageWriter), AppError> {
        let mut conflicts: HashSet<String> = HashSet::new();

        for attempt in 1..=self.config.create_attempts {
            let mut taken = self
                .storage
                .list_names()
                .await
                .map_err(|e| AppError::io("Failed to list upload directory", e))?;
            taken.extend(conflicts.iter().cloned());

            let name = name_resolver::resolve(desired, &taken);
            match self.storage.create_exclusive(&name).await {
                Ok(file) => return Ok((name, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    tracing::warn!(
                        "{} was created concurrently (attempt {}/{}), resolving again",
                        name,
                        attempt,
                        self.config.create_attempts
                    );
                    conflicts.insert(name);
                }
                Err(e) => {
                    tracing::error!("Failed to create file {}: {}", name, e);
                    return Err(AppError::io("Failed to create file", e));
                }
            }
        }

        Err(AppError::io(
            "Failed to create file",
            io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!(
                    "no free name for {} after {} attempts",
                    desired, self.config.create_attempts
                ),
            ),
        ))
    }

    async fn discard_oversized(&self, name: &str) {
        match self.storage.remove(name).await {
            Ok(()) => tracing::warn!("Removed oversized upload {}", name),
            Err(e) => tracing::error!("Failed to remove oversized upload {}: {}", name, e),
        }
    }
}

/// Reads until `limit` bytes are buffered or the stream ends.
async fn probe<R>(reader: &mut R, limit: usize) -> io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut header = Vec::with_capacity(limit);
    (&mut *reader)
        .take(limit as u64)
        .read_to_end(&mut header)
        .await?;
    Ok(header)
}
