use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use utoipa::ToSchema;

pub mod local;
pub mod memory;

pub use local::LocalStorageService;
pub use memory::MemoryStorageService;

pub type StorageReader = Box<dyn AsyncRead + Send + Unpin>;
pub type StorageWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// One file currently held by the storage directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StoredEntry {
    pub name: String,
    pub size: u64,
}

/// An opened stored file, sized at the moment it was opened.
pub struct OpenedFile {
    pub reader: StorageReader,
    pub size: u64,
}

/// The flat directory every upload lands in and every download is read from.
///
/// `create_exclusive` is the only place name uniqueness is enforced: it must
/// fail with [`io::ErrorKind::AlreadyExists`] rather than replace an existing
/// file. Lookups of absent names fail with [`io::ErrorKind::NotFound`].
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the storage directory if it does not exist yet.
    async fn ensure_root(&self) -> io::Result<()>;

    /// Every stored file, sorted by name.
    async fn list(&self) -> io::Result<Vec<StoredEntry>>;

    async fn create_exclusive(&self, name: &str) -> io::Result<StorageWriter>;

    async fn open_read(&self, name: &str) -> io::Result<OpenedFile>;

    async fn remove(&self, name: &str) -> io::Result<()>;

    /// Short label for logs and the health endpoint.
    fn describe(&self) -> String;

    async fn list_names(&self) -> io::Result<HashSet<String>> {
        Ok(self.list().await?.into_iter().map(|e| e.name).collect())
    }
}

/// Rejects names that would escape the flat namespace.
pub(crate) fn check_flat_name(name: &str) -> io::Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("'{}' is not a flat file name", name),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_flat_name() {
        assert!(check_flat_name("a b (2).txt").is_ok());
        assert!(check_flat_name(".hidden").is_ok());
        for bad in ["", ".", "..", "a/b", "a\\b", "nul\0"] {
            let err = check_flat_name(bad).unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput, "{:?}", bad);
        }
    }
}
