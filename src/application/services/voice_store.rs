//! Voice Store 门面
//!
//! 把元数据存储与音色表示存储合并成一套带所有权范围的 CRUD 契约。
//! 两个存储之间没有事务：
//! - 保存时先写 blob 再写元数据，元数据永远不会指向缺失的 blob
//! - 两步之间失败只会留下孤立 blob，不回滚
//! - 删除时先删元数据再删 blob，顺序同理

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{BlobStorePort, MetadataStorePort};
use crate::domain::voice::{OwnerId, VoiceBlob, VoiceId, VoiceRecord};

#[derive(Clone)]
pub struct VoiceStore {
    blobs: Arc<dyn BlobStorePort>,
    metadata: Arc<dyn MetadataStorePort>,
}

impl VoiceStore {
    pub fn new(blobs: Arc<dyn BlobStorePort>, metadata: Arc<dyn MetadataStorePort>) -> Self {
        Self { blobs, metadata }
    }

    pub fn create_id(&self) -> VoiceId {
        VoiceId::new()
    }

    pub async fn save(&self, record: &VoiceRecord, blob: &VoiceBlob) -> Result<(), ApplicationError> {
        self.blobs.put(&record.voice_id, blob).await?;
        self.metadata.insert(record).await?;

        tracing::info!(
            voice_id = %record.voice_id,
            owner = ?record.owner_id,
            blob_bytes = blob.len(),
            "Voice saved"
        );
        Ok(())
    }

    pub async fn load_blob(&self, id: &VoiceId) -> Result<VoiceBlob, ApplicationError> {
        self.blobs
            .get(id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Voice", id))
    }

    /// 查找对 owner 可见的记录
    async fn find_visible(
        &self,
        id: &VoiceId,
        owner: Option<&OwnerId>,
    ) -> Result<Option<VoiceRecord>, ApplicationError> {
        let record = self.metadata.find(id).await?;
        Ok(record.filter(|r| r.is_visible_to(owner)))
    }

    pub async fn get(
        &self,
        id: &VoiceId,
        owner: Option<&OwnerId>,
    ) -> Result<VoiceRecord, ApplicationError> {
        self.find_visible(id, owner)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Voice", id))
    }

    pub async fn list(&self, owner: Option<&OwnerId>) -> Result<Vec<VoiceRecord>, ApplicationError> {
        Ok(self.metadata.list(owner).await?)
    }

    /// 更新名称
    ///
    /// 不可见时返回 false；没有给出新名称（或名称全是空白）时只报告可见性。
    pub async fn update(
        &self,
        id: &VoiceId,
        name: Option<&str>,
        owner: Option<&OwnerId>,
    ) -> Result<bool, ApplicationError> {
        if self.find_visible(id, owner).await?.is_none() {
            return Ok(false);
        }

        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name,
            None => return Ok(true),
        };

        let updated = self.metadata.rename(id, name).await?;
        if updated {
            tracing::info!(voice_id = %id, name = %name, "Voice renamed");
        }
        Ok(updated)
    }

    /// 删除音色
    ///
    /// 提供 owner 时必须先确认记录可见，否则不产生任何副作用并返回 false。
    /// 不提供 owner（管理员下架）时无条件删除两侧，也会清理孤立 blob。
    pub async fn delete(&self, id: &VoiceId, owner: Option<&OwnerId>) -> Result<bool, ApplicationError> {
        if owner.is_some() && self.find_visible(id, owner).await?.is_none() {
            return Ok(false);
        }

        let had_metadata = self.metadata.delete(id).await?;
        let had_blob = self.blobs.delete(id).await?;

        let deleted = match owner {
            Some(_) => had_metadata,
            None => had_metadata || had_blob,
        };

        if deleted {
            tracing::info!(
                voice_id = %id,
                owner = ?owner,
                had_metadata,
                had_blob,
                "Voice deleted"
            );
        }
        Ok(deleted)
    }
}
