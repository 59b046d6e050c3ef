//! Disk-backed photo files under a root directory.
//!
//! Files are named by photo key. Keys are single path segments; anything
//! that could escape the root is rejected.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::types::{FileEntry, LocalFilesystem, StoreError};

#[derive(Debug, Clone)]
pub struct TokioFilesystem {
    root: PathBuf,
}

impl TokioFilesystem {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key.split('/').all(|segment| !segment.is_empty() && segment != "." && segment != "..")
            && !key.contains('\\');
        if !valid {
            return Err(StoreError::InvalidRecord(format!("invalid file key: {key:?}")));
        }
        Ok(self.root.join(key))
    }

    fn entry(key: &str, path: &Path) -> FileEntry {
        FileEntry { key: key.to_owned(), uri: format!("file://{}", path.display()) }
    }
}

/// Key of `key` inside `dir`, where `"."` or `""` means the root.
#[must_use]
pub fn join_key(dir: &str, key: &str) -> String {
    let dir = dir.trim_matches('/');
    if dir.is_empty() || dir == "." { key.to_owned() } else { format!("{dir}/{key}") }
}

#[async_trait::async_trait]
impl LocalFilesystem for TokioFilesystem {
    async fn write(&self, key: &str, bytes: &[u8], _mime_type: &str) -> Result<FileEntry, StoreError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(Self::entry(key, &path))
    }

    async fn mv(&self, old_key: &str, dir: &str, new_key: &str) -> Result<FileEntry, StoreError> {
        let from = self.path_for(old_key)?;
        let target = join_key(dir, new_key);
        let to = self.path_for(&target)?;
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(&from, &to).await?;
        Ok(Self::entry(&target, &to))
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(key.to_owned())),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "disk_test.rs"]
mod tests;
