//! Object Sidecar Store - 对象存储中的元数据
//!
//! 布局：
//! - `{voice_id}.json`：单条记录
//! - `index.json`：全部记录的数组（创建时间倒序），弥补对象存储没有列举能力
//!
//! 索引采用读-改-写，写入后重新读取确认，被并发写者覆盖时重做，最多 3 次。
//! 对象存储没有条件写，重做只缩小竞争窗口，不能消除。
//! 单条记录始终是权威来源：find 只读单条记录，索引只服务于 list。

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::ports::{MetadataStorePort, ObjectStorePort, RepositoryError};
use crate::domain::voice::{sort_newest_first, OwnerId, VoiceId, VoiceRecord};

pub const INDEX_KEY: &str = "index.json";

const INDEX_ATTEMPTS: usize = 3;

pub struct ObjectSidecarStore {
    objects: Arc<dyn ObjectStorePort>,
}

impl ObjectSidecarStore {
    pub fn new(objects: Arc<dyn ObjectStorePort>) -> Self {
        Self { objects }
    }

    fn key(id: &VoiceId) -> String {
        format!("{}.json", id)
    }

    async fn load_index(&self) -> Result<Vec<VoiceRecord>, RepositoryError> {
        match self.objects.get(INDEX_KEY).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    async fn store_index(&self, mut index: Vec<VoiceRecord>) -> Result<(), RepositoryError> {
        sort_newest_first(&mut index);
        self.objects
            .put(INDEX_KEY, serde_json::to_vec_pretty(&index)?)
            .await?;
        Ok(())
    }

    /// 替换索引中的单条记录，`record` 为 None 表示移除
    async fn update_index(&self, id: &VoiceId, record: Option<&VoiceRecord>) -> Result<(), RepositoryError> {
        for attempt in 1..=INDEX_ATTEMPTS {
            let mut index = self.load_index().await?;
            index.retain(|r| &r.voice_id != id);
            if let Some(record) = record {
                index.push(record.clone());
            }
            self.store_index(index).await?;

            let current = self.load_index().await?;
            if current.iter().find(|r| &r.voice_id == id) == record {
                return Ok(());
            }
            tracing::debug!(voice_id = %id, attempt, "Index entry overwritten by a concurrent writer, retrying");
        }

        tracing::warn!(
            voice_id = %id,
            attempts = INDEX_ATTEMPTS,
            "Index entry did not settle; list may be stale until the next write"
        );
        Ok(())
    }
}

#[async_trait]
impl MetadataStorePort for ObjectSidecarStore {
    async fn insert(&self, record: &VoiceRecord) -> Result<(), RepositoryError> {
        self.objects
            .put(&Self::key(&record.voice_id), serde_json::to_vec_pretty(record)?)
            .await?;
        self.update_index(&record.voice_id, Some(record)).await
    }

    async fn find(&self, id: &VoiceId) -> Result<Option<VoiceRecord>, RepositoryError> {
        match self.objects.get(&Self::key(id)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn list(&self, owner: Option<&OwnerId>) -> Result<Vec<VoiceRecord>, RepositoryError> {
        let mut records: Vec<VoiceRecord> = self
            .load_index()
            .await?
            .into_iter()
            .filter(|r| r.is_visible_to(owner))
            .collect();
        sort_newest_first(&mut records);
        Ok(records)
    }

    async fn rename(&self, id: &VoiceId, name: &str) -> Result<bool, RepositoryError> {
        let mut record = match self.find(id).await? {
            Some(record) => record,
            None => return Ok(false),
        };
        record.name = name.trim().to_string();
        self.objects
            .put(&Self::key(id), serde_json::to_vec_pretty(&record)?)
            .await?;
        self.update_index(id, Some(&record)).await?;
        Ok(true)
    }

    async fn delete(&self, id: &VoiceId) -> Result<bool, RepositoryError> {
        let key = Self::key(id);
        let existed = self.objects.exists(&key).await?;
        if existed {
            self.objects.delete(&key).await?;
        }
        // 即使单条记录已不存在也清理索引中的残留
        self.update_index(id, None).await?;
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ObjectStoreError;
    use crate::infrastructure::memory::InMemoryObjectStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_index_tracks_insert_rename_delete() {
        let objects = Arc::new(InMemoryObjectStore::new());
        let store = ObjectSidecarStore::new(objects.clone());

        let record = VoiceRecord::new(VoiceId::new(), "Scout", "tts", None, None);
        store.insert(&record).await.unwrap();
        assert!(objects.contains(INDEX_KEY));
        assert!(objects.contains(&format!("{}.json", record.voice_id)));

        assert!(store.rename(&record.voice_id, "Ranger").await.unwrap());
        let listed = store.list(None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Ranger");

        assert!(store.delete(&record.voice_id).await.unwrap());
        assert!(store.list(None).await.unwrap().is_empty());
        assert!(!store.delete(&record.voice_id).await.unwrap());
    }

    /// 第一次写索引之后，模拟另一个进程用旧快照覆盖索引
    struct StaleIndexWriter {
        inner: InMemoryObjectStore,
        clobbers_left: AtomicUsize,
    }

    #[async_trait]
    impl ObjectStorePort for StaleIndexWriter {
        async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), ObjectStoreError> {
            self.inner.put(key, bytes).await?;
            let clobber = key == INDEX_KEY
                && self
                    .clobbers_left
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok();
            if clobber {
                self.inner.put(INDEX_KEY, b"[]".to_vec()).await?;
            }
            Ok(())
        }

        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ObjectStoreError> {
            self.inner.get(key).await
        }

        async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError> {
            self.inner.exists(key).await
        }

        async fn delete(&self, key: &str) -> Result<(), ObjectStoreError> {
            self.inner.delete(key).await
        }
    }

    #[tokio::test]
    async fn test_index_rewritten_after_concurrent_overwrite() {
        let objects = Arc::new(StaleIndexWriter {
            inner: InMemoryObjectStore::new(),
            clobbers_left: AtomicUsize::new(2),
        });
        let store = ObjectSidecarStore::new(objects.clone());

        let record = VoiceRecord::new(VoiceId::new(), "Courier", "tts", None, None);
        store.insert(&record).await.unwrap();

        assert_eq!(objects.clobbers_left.load(Ordering::SeqCst), 0);
        assert_eq!(store.list(None).await.unwrap(), vec![record]);
    }

    #[tokio::test]
    async fn test_index_gives_up_without_error_when_never_settled() {
        let objects = Arc::new(StaleIndexWriter {
            inner: InMemoryObjectStore::new(),
            clobbers_left: AtomicUsize::new(usize::MAX),
        });
        let store = ObjectSidecarStore::new(objects);

        let record = VoiceRecord::new(VoiceId::new(), "Ghost", "tts", None, None);
        store.insert(&record).await.unwrap();

        // 单条记录仍可读取，只是 list 暂时看不到
        assert_eq!(store.find(&record.voice_id).await.unwrap(), Some(record));
        assert!(store.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_index_lists_empty() {
        let store = ObjectSidecarStore::new(Arc::new(InMemoryObjectStore::new()));
        assert!(store.list(None).await.unwrap().is_empty());
    }
}
