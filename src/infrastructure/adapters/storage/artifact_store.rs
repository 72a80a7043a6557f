//! File Artifact Store - 合成产物目录

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::write_atomic;
use crate::application::ports::{ArtifactStorePort, RepositoryError};

pub struct FileArtifactStore {
    base_dir: PathBuf,
}

impl FileArtifactStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[async_trait]
impl ArtifactStorePort for FileArtifactStore {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, RepositoryError> {
        let path = self.base_dir.join(file_name);
        write_atomic(&path, bytes).await?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Artifact saved");
        Ok(path)
    }

    async fn locate(&self, file_name: &str) -> Option<PathBuf> {
        let path = self.base_dir.join(file_name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Some(path),
            _ => None,
        }
    }
}
