use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{ensure, Context};
use folio_storage_contracts::KeyValueStore;
use tracing::instrument;

/// A [`KeyValueStore`] keeping every key in its own file inside a directory.
///
/// Writes go to a temporary file first and are moved into place afterwards,
/// so readers never observe a partially written value.
#[derive(Debug, Clone)]
pub struct FsKeyValueStore {
    directory: Arc<Path>,
}

impl FsKeyValueStore {
    /// Opens the store at `directory`, creating the directory if necessary.
    pub async fn open(directory: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let directory = directory.into();
        tokio::fs::create_dir_all(&directory).await.with_context(|| {
            format!(
                "Failed to create storage directory at {}",
                directory.display()
            )
        })?;

        Ok(Self {
            directory: directory.into(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path(&self, key: &str) -> anyhow::Result<PathBuf> {
        ensure!(
            !key.is_empty()
                && key
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
                && !key.starts_with('.'),
            "Invalid storage key: {key:?}"
        );
        Ok(self.directory.join(key))
    }
}

impl KeyValueStore for FsKeyValueStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let path = self.path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err)
                .with_context(|| format!("Failed to read storage file at {}", path.display())),
        }
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let path = self.path(key)?;
        let tmp = self
            .directory
            .join(format!(".{key}.{}.tmp", uuid::Uuid::new_v4()));

        tokio::fs::write(&tmp, value)
            .await
            .with_context(|| format!("Failed to write storage file at {}", tmp.display()))?;

        if let Err(err) = tokio::fs::rename(&tmp, &path).await {
            tokio::fs::remove_file(&tmp).await.ok();
            return Err(err)
                .with_context(|| format!("Failed to replace storage file at {}", path.display()));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        let path = self.path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("Failed to remove storage file at {}", path.display())),
        }
    }
}
