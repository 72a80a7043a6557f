//! Artifact Cache Port - 一次性合成产物的有界缓存
//!
//! 只跟踪本进程产生的文件，不跨进程共享。

use async_trait::async_trait;
use std::path::PathBuf;

#[async_trait]
pub trait ArtifactCachePort: Send + Sync {
    /// 登记新文件；已满时先淘汰最早的条目，返回被淘汰的路径
    async fn insert(&self, path: PathBuf) -> Option<PathBuf>;

    /// 当前登记的文件数
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn contains(&self, path: &std::path::Path) -> bool;

    /// 删除全部文件并清空，返回清理条目数
    async fn clear(&self) -> usize;
}
