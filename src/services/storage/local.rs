use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::{OpenedFile, StorageService, StorageWriter, StoredEntry, check_flat_name};

/// Storage backed by a single directory on the local filesystem.
pub struct LocalStorageService {
    root: PathBuf,
}

impl LocalStorageService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> io::Result<PathBuf> {
        check_flat_name(name)?;
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl StorageService for LocalStorageService {
    async fn ensure_root(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    async fn list(&self) -> io::Result<Vec<StoredEntry>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            // Nothing uploaded yet
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(m) => m,
                // Removed between read_dir and stat
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };
            if !metadata.is_file() {
                continue;
            }
            files.push(StoredEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
            });
        }

        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    async fn create_exclusive(&self, name: &str) -> io::Result<StorageWriter> {
        let path = self.path_for(name)?;
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        Ok(Box::new(file))
    }

    async fn open_read(&self, name: &str) -> io::Result<OpenedFile> {
        let path = self.path_for(name)?;
        let file = fs::File::open(&path).await?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("'{}' is not a regular file", name),
            ));
        }
        Ok(OpenedFile {
            reader: Box::new(file),
            size: metadata.len(),
        })
    }

    async fn remove(&self, name: &str) -> io::Result<()> {
        let path = self.path_for(name)?;
        fs::remove_file(&path).await
    }

    fn describe(&self) -> String {
        format!("local:{}", self.root.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_list_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorageService::new(dir.path().join("not-yet"));
        assert!(storage.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_exclusive_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorageService::new(dir.path());
        storage.ensure_root().await.unwrap();

        let mut writer = storage.create_exclusive("a.txt").await.unwrap();
        writer.write_all(b"first").await.unwrap();
        writer.shutdown().await.unwrap();
        drop(writer);

        let err = match storage.create_exclusive("a.txt").await {
            Ok(_) => panic!("second exclusive create must fail"),
            Err(e) => e,
        };
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);

        let mut opened = storage.open_read("a.txt").await.unwrap();
        let mut data = Vec::new();
        opened.reader.read_to_end(&mut data).await.unwrap();
        assert_eq!(data, b"first");
        assert_eq!(opened.size, 5);
    }

    #[tokio::test]
    async fn test_list_skips_directories_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.bin"), b"12").unwrap();
        std::fs::write(dir.path().join("a.bin"), b"1").unwrap();

        let storage = LocalStorageService::new(dir.path());
        let listed = storage.list().await.unwrap();
        assert_eq!(
            listed,
            vec![
                StoredEntry { name: "a.bin".into(), size: 1 },
                StoredEntry { name: "b.bin".into(), size: 2 },
            ]
        );
        assert_eq!(
            storage.open_read("nested").await.err().map(|e| e.kind()),
            Some(io::ErrorKind::NotFound)
        );
    }

    #[tokio::test]
    async fn test_rejects_nested_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorageService::new(dir.path());
        let err = match storage.open_read("../etc/passwd").await {
            Ok(_) => panic!("traversal must be rejected"),
            Err(e) => e,
        };
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
