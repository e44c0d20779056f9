use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;

use super::{OpenedFile, StorageService, StorageWriter, StoredEntry, check_flat_name};

type Files = Arc<Mutex<BTreeMap<String, Vec<u8>>>>;

fn lock(files: &Files) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
    // A panicking writer cannot leave the map itself inconsistent.
    files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory storage with the same exclusivity rules as the local backend.
///
/// Counts every trait call so tests can assert a request never touched storage.
#[derive(Clone, Default)]
pub struct MemoryStorageService {
    files: Files,
    operations: Arc<AtomicUsize>,
    root_unavailable: Arc<AtomicBool>,
}

impl MemoryStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `ensure_root` fail, as a missing, unwritable directory would.
    pub fn with_unavailable_root(self) -> Self {
        self.root_unavailable.store(true, Ordering::SeqCst);
        self
    }

    pub fn insert(&self, name: &str, data: impl Into<Vec<u8>>) {
        lock(&self.files).insert(name.to_string(), data.into());
    }

    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        lock(&self.files).get(name).cloned()
    }

    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.operations.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl StorageService for MemoryStorageService {
    async fn ensure_root(&self) -> io::Result<()> {
        self.touch();
        if self.root_unavailable.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "storage root cannot be created",
            ));
        }
        Ok(())
    }

    async fn list(&self) -> io::Result<Vec<StoredEntry>> {
        self.touch();
        Ok(lock(&self.files)
            .iter()
            .map(|(name, data)| StoredEntry {
                name: name.clone(),
                size: data.len() as u64,
            })
            .collect())
    }

    async fn create_exclusive(&self, name: &str) -> io::Result<StorageWriter> {
        self.touch();
        check_flat_name(name)?;
        let mut files = lock(&self.files);
        if files.contains_key(name) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("'{}' already exists", name),
            ));
        }
        files.insert(name.to_string(), Vec::new());
        Ok(Box::new(MemoryWriter {
            files: self.files.clone(),
            name: name.to_string(),
        }))
    }

    async fn open_read(&self, name: &str) -> io::Result<OpenedFile> {
        self.touch();
        check_flat_name(name)?;
        let data = lock(&self.files).get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("'{}' not found", name))
        })?;
        let size = data.len() as u64;
        Ok(OpenedFile {
            reader: Box::new(io::Cursor::new(data)),
            size,
        })
    }

    async fn remove(&self, name: &str) -> io::Result<()> {
        self.touch();
        check_flat_name(name)?;
        lock(&self.files)
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("'{}' not found", name)))
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Appends straight into the shared map; data is visible as soon as it is written.
struct MemoryWriter {
    files: Files,
    name: String,
}

impl AsyncWrite for MemoryWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let mut files = lock(&self.files);
        match files.get_mut(&self.name) {
            Some(data) => {
                data.extend_from_slice(buf);
                Poll::Ready(Ok(buf.len()))
            }
            None => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("'{}' was removed while being written", self.name),
            ))),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
