//! Backend Selection - 按配置组装音色存储
//!
//! blob 后端（本地目录 / 远程对象存储）与元数据后端（扁平文件 / SQLite）
//! 两两组合，启动时选定一次，运行期间不再切换。

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::application::ports::{
    BlobStorePort, EngineError, MetadataStorePort, ObjectStoreError, ObjectStorePort,
};
use crate::application::services::VoiceStore;
use crate::config::{MetadataBackend, StorageConfig};
use crate::infrastructure::adapters::storage::{
    HttpObjectStore, HttpObjectStoreConfig, LocalBlobStore, ObjectBlobStore,
};
use crate::infrastructure::persistence::flat_file::{LocalSidecarStore, ObjectSidecarStore};
use crate::infrastructure::persistence::sqlite::{DbPool, SqliteMetadataStore};

/// 启动期错误
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] ObjectStoreError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// blob 所在位置，扁平元数据跟随它
#[derive(Clone)]
pub enum BlobLocation {
    Local(PathBuf),
    Remote(Arc<dyn ObjectStorePort>),
}

/// 组装音色存储
///
/// 关系型元数据需要传入连接池。
pub fn assemble_voice_store(
    blob: BlobLocation,
    metadata: MetadataBackend,
    pool: Option<DbPool>,
) -> Result<VoiceStore, BootstrapError> {
    let (blobs, sidecars): (Arc<dyn BlobStorePort>, Arc<dyn MetadataStorePort>) = match blob {
        BlobLocation::Local(dir) => (
            Arc::new(LocalBlobStore::new(&dir)),
            Arc::new(LocalSidecarStore::new(&dir)),
        ),
        BlobLocation::Remote(objects) => (
            Arc::new(ObjectBlobStore::new(objects.clone())),
            Arc::new(ObjectSidecarStore::new(objects)),
        ),
    };

    let metadata: Arc<dyn MetadataStorePort> = match metadata {
        MetadataBackend::FlatFile => sidecars,
        MetadataBackend::Relational => {
            let pool = pool.ok_or_else(|| {
                BootstrapError::Config("Relational metadata requires a database pool".to_string())
            })?;
            Arc::new(SqliteMetadataStore::new(pool))
        }
    };

    Ok(VoiceStore::new(blobs, metadata))
}

/// 按存储配置构建音色存储
pub fn build_voice_store(
    config: &StorageConfig,
    pool: Option<DbPool>,
) -> Result<VoiceStore, BootstrapError> {
    let blob = match config.blob_backend {
        crate::config::BlobBackend::Local => BlobLocation::Local(config.voices_dir.clone()),
        crate::config::BlobBackend::Remote => {
            let remote = &config.remote;
            let objects = HttpObjectStore::new(HttpObjectStoreConfig {
                endpoint: remote.endpoint.clone(),
                bucket: remote.bucket.clone(),
                access_token: remote.access_token.clone(),
                timeout_secs: remote.timeout_secs,
            })?;
            BlobLocation::Remote(Arc::new(objects))
        }
    };

    tracing::info!(
        blob = ?config.blob_backend,
        metadata = ?config.metadata_backend,
        "Voice store assembled"
    );
    assemble_voice_store(blob, config.metadata_backend, pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::voice::{OwnerId, VoiceBlob, VoiceRecord};
    use crate::infrastructure::memory::InMemoryObjectStore;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};
    use chrono::Duration;
    use std::path::Path;
    use tempfile::tempdir;

    async fn pool() -> DbPool {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    /// 四种组合
    async fn every_pairing(dir: &Path) -> Vec<(&'static str, VoiceStore)> {
        let objects: Arc<dyn ObjectStorePort> = Arc::new(InMemoryObjectStore::new());
        let remote_objects: Arc<dyn ObjectStorePort> = Arc::new(InMemoryObjectStore::new());
        vec![
            (
                "local+flat_file",
                assemble_voice_store(
                    BlobLocation::Local(dir.join("a")),
                    MetadataBackend::FlatFile,
                    None,
                )
                .unwrap(),
            ),
            (
                "local+relational",
                assemble_voice_store(
                    BlobLocation::Local(dir.join("b")),
                    MetadataBackend::Relational,
                    Some(pool().await),
                )
                .unwrap(),
            ),
            (
                "remote+flat_file",
                assemble_voice_store(BlobLocation::Remote(objects), MetadataBackend::FlatFile, None)
                    .unwrap(),
            ),
            (
                "remote+relational",
                assemble_voice_store(
                    BlobLocation::Remote(remote_objects),
                    MetadataBackend::Relational,
                    Some(pool().await),
                )
                .unwrap(),
            ),
        ]
    }

    async fn save(store: &VoiceStore, name: &str, owner: Option<&str>) -> VoiceRecord {
        let record = VoiceRecord::new(store.create_id(), name, "tts", owner.map(OwnerId::new), None);
        store
            .save(&record, &VoiceBlob::new(format!("blob-{}", name).into_bytes()))
            .await
            .unwrap();
        record
    }

    #[tokio::test]
    async fn test_relational_requires_pool() {
        let dir = tempdir().unwrap();
        let result = assemble_voice_store(
            BlobLocation::Local(dir.path().to_path_buf()),
            MetadataBackend::Relational,
            None,
        );
        assert!(matches!(result, Err(BootstrapError::Config(_))));
    }

    #[tokio::test]
    async fn test_save_load_delete_in_every_pairing() {
        let dir = tempdir().unwrap();
        for (label, store) in every_pairing(dir.path()).await {
            let record = save(&store, "Herald", None).await;
            let id = record.voice_id;

            let blob = store.load_blob(&id).await.unwrap();
            assert_eq!(blob.as_bytes(), b"blob-Herald", "{}", label);
            assert_eq!(store.get(&id, None).await.unwrap(), record, "{}", label);

            assert!(store.delete(&id, None).await.unwrap(), "{}", label);
            assert!(store.get(&id, None).await.unwrap_err().is_not_found(), "{}", label);
            assert!(store.load_blob(&id).await.unwrap_err().is_not_found(), "{}", label);
            assert!(!store.delete(&id, None).await.unwrap(), "{}", label);
        }
    }

    #[tokio::test]
    async fn test_owner_isolation_in_every_pairing() {
        let dir = tempdir().unwrap();
        let alice = OwnerId::new("alice");
        let bob = OwnerId::new("bob");

        for (label, store) in every_pairing(dir.path()).await {
            let record = save(&store, "Private", Some("alice")).await;
            let id = record.voice_id;

            assert!(store.get(&id, Some(&bob)).await.unwrap_err().is_not_found(), "{}", label);
            assert!(store.list(Some(&bob)).await.unwrap().is_empty(), "{}", label);
            assert!(!store.update(&id, Some("Stolen"), Some(&bob)).await.unwrap(), "{}", label);
            assert!(!store.delete(&id, Some(&bob)).await.unwrap(), "{}", label);

            // 越权操作没有任何副作用
            let still = store.get(&id, Some(&alice)).await.unwrap();
            assert_eq!(still.name, "Private", "{}", label);
            assert!(store.load_blob(&id).await.is_ok(), "{}", label);
        }
    }

    #[tokio::test]
    async fn test_list_is_newest_first_in_every_pairing() {
        let dir = tempdir().unwrap();
        for (label, store) in every_pairing(dir.path()).await {
            let mut older = VoiceRecord::new(store.create_id(), "Older", "tts", None, None);
            older.created_at = older.created_at - Duration::seconds(30);
            store.save(&older, &VoiceBlob::new(b"o".to_vec())).await.unwrap();
            let newer = save(&store, "Newer", None).await;

            let names: Vec<String> = store
                .list(None)
                .await
                .unwrap()
                .into_iter()
                .map(|r| r.name)
                .collect();
            assert_eq!(names, vec!["Newer".to_string(), "Older".to_string()], "{}", label);
            assert_ne!(newer.voice_id, older.voice_id);
        }
    }
}
