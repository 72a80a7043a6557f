//! Local Sidecar Store - 本地目录中的元数据文件
//!
//! 布局：`{voices_dir}/{voice_id}.json`，与 blob 文件并列。
//! 列表通过扫描目录得到，无需索引。

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::application::ports::{MetadataStorePort, RepositoryError};
use crate::domain::voice::{sort_newest_first, OwnerId, VoiceId, VoiceRecord};
use crate::infrastructure::adapters::storage::{read_if_exists, remove_if_exists, write_atomic};

pub struct LocalSidecarStore {
    base_dir: PathBuf,
}

impl LocalSidecarStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    fn sidecar_path(&self, id: &VoiceId) -> PathBuf {
        self.base_dir.join(format!("{}.json", id))
    }

    async fn read(&self, path: &Path) -> Result<Option<VoiceRecord>, RepositoryError> {
        match read_if_exists(path).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl MetadataStorePort for LocalSidecarStore {
    async fn insert(&self, record: &VoiceRecord) -> Result<(), RepositoryError> {
        let bytes = serde_json::to_vec_pretty(record)?;
        write_atomic(&self.sidecar_path(&record.voice_id), &bytes).await?;
        Ok(())
    }

    async fn find(&self, id: &VoiceId) -> Result<Option<VoiceRecord>, RepositoryError> {
        self.read(&self.sidecar_path(id)).await
    }

    async fn list(&self, owner: Option<&OwnerId>) -> Result<Vec<VoiceRecord>, RepositoryError> {
        let mut entries = match fs::read_dir(&self.base_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_sidecar = path.extension().map_or(false, |ext| ext == "json")
                && path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(VoiceId::parse)
                    .is_some();
            if !is_sidecar {
                continue;
            }

            // 扫描期间被其他进程删除的文件直接跳过；损坏的文件记录后跳过
            match self.read(&path).await {
                Ok(Some(record)) if record.is_visible_to(owner) => records.push(record),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable sidecar");
                }
            }
        }

        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn rename(&self, id: &VoiceId, name: &str) -> Result<bool, RepositoryError> {
        let path = self.sidecar_path(id);
        let mut record = match self.read(&path).await? {
            Some(record) => record,
            None => return Ok(false),
        };
        record.name = name.trim().to_string();
        write_atomic(&path, &serde_json::to_vec_pretty(&record)?).await?;
        Ok(true)
    }

    async fn delete(&self, id: &VoiceId) -> Result<bool, RepositoryError> {
        Ok(remove_if_exists(&self.sidecar_path(id)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_sidecar_layout() {
        let dir = tempdir().unwrap();
        let store = LocalSidecarStore::new(dir.path());
        let record = VoiceRecord::new(VoiceId::new(), "Bard", "tts", None, Some("elves".into()));
        store.insert(&record).await.unwrap();

        let raw = std::fs::read(dir.path().join(format!("{}.json", record.voice_id))).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        for field in ["voice_id", "name", "consent_scope", "created_at", "faction"] {
            assert!(json.get(field).is_some(), "missing {}", field);
        }
    }

    #[tokio::test]
    async fn test_list_ignores_foreign_files() {
        let dir = tempdir().unwrap();
        let store = LocalSidecarStore::new(dir.path());
        store
            .insert(&VoiceRecord::new(VoiceId::new(), "A", "tts", None, None))
            .await
            .unwrap();
        std::fs::write(dir.path().join("index.json"), b"[]").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hi").unwrap();

        assert_eq!(store.list(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let dir = tempdir().unwrap();
        let store = LocalSidecarStore::new(dir.path().join("nope"));
        assert!(store.list(None).await.unwrap().is_empty());
    }
}
