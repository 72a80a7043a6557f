//! Repository Ports - 出站端口
//!
//! 音色元数据与音色表示的持久化抽象。
//! 具体实现在 infrastructure 层（本地目录、对象存储、SQLite）。

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::voice::{OwnerId, VoiceBlob, VoiceId, VoiceRecord};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Object store error: {0}")]
    ObjectStore(#[from] super::ObjectStoreError),
}

impl From<std::io::Error> for RepositoryError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

// ============================================================================
// Blob Store
// ============================================================================

/// 音色表示存储
///
/// 每个 voice_id 至多一个 blob，内容按原样存取。
#[async_trait]
pub trait BlobStorePort: Send + Sync {
    /// 写入（覆盖）
    async fn put(&self, id: &VoiceId, blob: &VoiceBlob) -> Result<(), RepositoryError>;

    /// 读取，不存在返回 None
    async fn get(&self, id: &VoiceId) -> Result<Option<VoiceBlob>, RepositoryError>;

    /// 删除，返回是否确实删除了内容
    async fn delete(&self, id: &VoiceId) -> Result<bool, RepositoryError>;
}

// ============================================================================
// Metadata Store
// ============================================================================

/// 音色元数据存储
///
/// 元数据是否存在决定音色是否存在。
#[async_trait]
pub trait MetadataStorePort: Send + Sync {
    /// 写入（覆盖）
    async fn insert(&self, record: &VoiceRecord) -> Result<(), RepositoryError>;

    /// 按 id 查找，不做所有权过滤
    async fn find(&self, id: &VoiceId) -> Result<Option<VoiceRecord>, RepositoryError>;

    /// 列出对 owner 可见的记录，创建时间倒序
    async fn list(&self, owner: Option<&OwnerId>) -> Result<Vec<VoiceRecord>, RepositoryError>;

    /// 更新名称，返回记录是否存在
    async fn rename(&self, id: &VoiceId, name: &str) -> Result<bool, RepositoryError>;

    /// 删除，返回记录是否存在
    async fn delete(&self, id: &VoiceId) -> Result<bool, RepositoryError>;
}
