//! Storage Adapter - 文件系统与对象存储实现

mod artifact_store;
mod http_object_store;
mod local_blob_store;
mod object_blob_store;

pub use artifact_store::FileArtifactStore;
pub use http_object_store::{HttpObjectStore, HttpObjectStoreConfig};
pub use local_blob_store::LocalBlobStore;
pub use object_blob_store::ObjectBlobStore;

use std::path::Path;
use tokio::fs;
use uuid::Uuid;

/// 先写临时文件再 rename，多进程并发写同一路径时后写者胜出，读者不会看到半个文件
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).await?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = dir.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    fs::write(&tmp, bytes).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

/// 删除文件，返回文件此前是否存在
pub(crate) async fn remove_if_exists(path: &Path) -> std::io::Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// 读取文件，不存在返回 None
pub(crate) async fn read_if_exists(path: &Path) -> std::io::Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}
