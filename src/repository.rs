// Whole-list persistence: `load()` returns everything, `save()` replaces it.
// Used for small documents such as the email draft library.

use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ListStoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed list in {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait ListRepository<T>: Send + Sync
where
    T: Send + Sync + 'static,
{
    async fn load(&self) -> Result<Vec<T>, ListStoreError>;

    async fn save(&self, items: &[T]) -> Result<(), ListStoreError>;
}

/// A JSON array on disk. A missing file loads as an empty list.
#[derive(Debug, Clone)]
pub struct JsonFileRepository<T> {
    path: PathBuf,
    _items: PhantomData<fn() -> T>,
}

impl<T> JsonFileRepository<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _items: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> ListStoreError {
        ListStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl<T> ListRepository<T> for JsonFileRepository<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn load(&self) -> Result<Vec<T>, ListStoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        serde_json::from_slice(&bytes).map_err(|source| ListStoreError::Format {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, items: &[T]) -> Result<(), ListStoreError> {
        let json = serde_json::to_vec_pretty(items).map_err(|source| ListStoreError::Format {
            path: self.path.clone(),
            source,
        })?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| self.io_error(e))?;

        // A fresh staging file beside the target per write, renamed over it
        let target = self.path.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut staging = tempfile::NamedTempFile::new_in(&dir)?;
            staging.write_all(&json)?;
            staging.as_file().sync_all()?;
            staging.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| self.io_error(std::io::Error::other(e)))?
        .map_err(|e| self.io_error(e))?;

        debug!("Saved {} items to {}", items.len(), self.path.display());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryListRepository<T> {
    items: RwLock<Vec<T>>,
}

impl<T> InMemoryListRepository<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }
}

#[async_trait]
impl<T> ListRepository<T> for InMemoryListRepository<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn load(&self) -> Result<Vec<T>, ListStoreError> {
        Ok(self.items.read().await.clone())
    }

    async fn save(&self, items: &[T]) -> Result<(), ListStoreError> {
        *self.items.write().await = items.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_save_replaces_list() {
        let repo = InMemoryListRepository::new(vec![1, 2, 3]);
        assert_eq!(repo.load().await.unwrap(), vec![1, 2, 3]);

        repo.save(&[9]).await.unwrap();
        assert_eq!(repo.load().await.unwrap(), vec![9]);
    }
}
