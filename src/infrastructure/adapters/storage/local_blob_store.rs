//! Local Blob Store - 本地目录中的音色表示
//!
//! 布局：`{voices_dir}/{voice_id}.bin`

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{read_if_exists, remove_if_exists, write_atomic};
use crate::application::ports::{BlobStorePort, RepositoryError};
use crate::domain::voice::{VoiceBlob, VoiceId};

pub struct LocalBlobStore {
    base_dir: PathBuf,
}

impl LocalBlobStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn blob_path(&self, id: &VoiceId) -> PathBuf {
        self.base_dir.join(format!("{}.bin", id))
    }
}

#[async_trait]
impl BlobStorePort for LocalBlobStore {
    async fn put(&self, id: &VoiceId, blob: &VoiceBlob) -> Result<(), RepositoryError> {
        let path = self.blob_path(id);
        write_atomic(&path, blob.as_bytes()).await?;
        tracing::debug!(voice_id = %id, path = %path.display(), bytes = blob.len(), "Blob written");
        Ok(())
    }

    async fn get(&self, id: &VoiceId) -> Result<Option<VoiceBlob>, RepositoryError> {
        Ok(read_if_exists(&self.blob_path(id)).await?.map(VoiceBlob::new))
    }

    async fn delete(&self, id: &VoiceId) -> Result<bool, RepositoryError> {
        Ok(remove_if_exists(&self.blob_path(id)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_blob_roundtrip_and_delete() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().join("voices"));
        let id = VoiceId::new();

        assert!(store.get(&id).await.unwrap().is_none());

        store.put(&id, &VoiceBlob::new(vec![1, 2, 3])).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap().unwrap().as_bytes(), &[1, 2, 3]);

        // 覆盖写
        store.put(&id, &VoiceBlob::new(vec![9])).await.unwrap();
        assert_eq!(store.get(&id).await.unwrap().unwrap().as_bytes(), &[9]);

        assert!(store.delete(&id).await.unwrap());
        assert!(!store.delete(&id).await.unwrap());
        assert!(!store.blob_path(&id).exists());
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        for _ in 0..3 {
            store.put(&VoiceId::new(), &VoiceBlob::new(vec![0; 32])).await.unwrap();
        }
        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .map(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
                    .unwrap_or(false)
            })
            .count();
        assert_eq!(leftovers, 0);
    }
}
