//! Artifact Store Port - 合成产物文件存储
//!
//! 产物按文件名定位：队列旁白用 `{job_id}.wav`，一次性合成用随机名。

use async_trait::async_trait;
use std::path::PathBuf;

use super::RepositoryError;

#[async_trait]
pub trait ArtifactStorePort: Send + Sync {
    /// 写入产物，返回文件路径
    async fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, RepositoryError>;

    /// 查找产物，文件不存在返回 None
    async fn locate(&self, file_name: &str) -> Option<PathBuf>;
}
