//! FIFO Artifact Cache - 一次性合成产物的有界登记表

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::application::ports::ArtifactCachePort;

/// 先进先出的产物缓存
///
/// 达到容量时先删除最早登记的文件再登记新文件，目录中的产物数不会超过容量。
pub struct FifoArtifactCache {
    capacity: usize,
    entries: Mutex<VecDeque<PathBuf>>,
}

impl FifoArtifactCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// 尽力删除，失败只记日志
async fn discard(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove evicted artifact");
        }
    }
}

#[async_trait]
impl ArtifactCachePort for FifoArtifactCache {
    async fn insert(&self, path: PathBuf) -> Option<PathBuf> {
        let mut entries = self.entries.lock().await;

        let evicted = if entries.len() >= self.capacity {
            entries.pop_front()
        } else {
            None
        };
        if let Some(old) = &evicted {
            discard(old).await;
            tracing::debug!(path = %old.display(), "Artifact evicted");
        }

        entries.push_back(path);
        evicted
    }

    async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    async fn contains(&self, path: &Path) -> bool {
        self.entries.lock().await.iter().any(|p| p == path)
    }

    async fn clear(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let count = entries.len();
        for path in entries.drain(..) {
            discard(&path).await;
        }
        tracing::debug!(count, "Artifact cache cleared");
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_evicts_oldest_and_deletes_file() {
        let dir = tempdir().unwrap();
        let cache = FifoArtifactCache::new(2);

        let mut paths = Vec::new();
        for i in 0..3 {
            let path = dir.path().join(format!("{}.wav", i));
            std::fs::write(&path, b"x").unwrap();
            paths.push(path);
        }

        assert_eq!(cache.insert(paths[0].clone()).await, None);
        assert_eq!(cache.insert(paths[1].clone()).await, None);
        assert_eq!(cache.insert(paths[2].clone()).await, Some(paths[0].clone()));

        assert!(!paths[0].exists());
        assert!(!cache.contains(&paths[0]).await);
        assert!(cache.contains(&paths[2]).await);
        assert_eq!(cache.len().await, 2);
    }

    #[tokio::test]
    async fn test_missing_file_does_not_block_eviction() {
        let cache = FifoArtifactCache::new(1);
        cache.insert(PathBuf::from("/nonexistent/a.wav")).await;
        let evicted = cache.insert(PathBuf::from("/nonexistent/b.wav")).await;
        assert_eq!(evicted, Some(PathBuf::from("/nonexistent/a.wav")));
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let dir = tempdir().unwrap();
        let cache = FifoArtifactCache::new(4);
        for i in 0..3 {
            let path = dir.path().join(format!("{}.wav", i));
            std::fs::write(&path, b"x").unwrap();
            cache.insert(path).await;
        }

        assert_eq!(cache.clear().await, 3);
        assert!(cache.is_empty().await);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
