//! Object Store Port - 远程对象存储抽象
//!
//! 只需要按 key 存取字节，不依赖原生列举能力。

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObjectStoreError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Unexpected status {status} for key {key}")]
    UnexpectedStatus { status: u16, key: String },
}

#[async_trait]
pub trait ObjectStorePort: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<(), ObjectStoreError>;

    /// 不存在返回 None
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ObjectStoreError>;

    async fn exists(&self, key: &str) -> Result<bool, ObjectStoreError>;

    /// 删除不存在的 key 不算错误
    async fn delete(&self, key: &str) -> Result<(), ObjectStoreError>;
}
