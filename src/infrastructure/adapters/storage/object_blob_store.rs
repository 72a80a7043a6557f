//! Object Blob Store - 对象存储中的音色表示
//!
//! 布局：key `{voice_id}.bin`

use async_trait::async_trait;
use std::sync::Arc;

use crate::application::ports::{BlobStorePort, ObjectStorePort, RepositoryError};
use crate::domain::voice::{VoiceBlob, VoiceId};

pub struct ObjectBlobStore {
    objects: Arc<dyn ObjectStorePort>,
}

impl ObjectBlobStore {
    pub fn new(objects: Arc<dyn ObjectStorePort>) -> Self {
        Self { objects }
    }

    fn key(id: &VoiceId) -> String {
        format!("{}.bin", id)
    }
}

#[async_trait]
impl BlobStorePort for ObjectBlobStore {
    async fn put(&self, id: &VoiceId, blob: &VoiceBlob) -> Result<(), RepositoryError> {
        self.objects.put(&Self::key(id), blob.as_bytes().to_vec()).await?;
        Ok(())
    }

    async fn get(&self, id: &VoiceId) -> Result<Option<VoiceBlob>, RepositoryError> {
        Ok(self.objects.get(&Self::key(id)).await?.map(VoiceBlob::new))
    }

    async fn delete(&self, id: &VoiceId) -> Result<bool, RepositoryError> {
        let key = Self::key(id);
        if !self.objects.exists(&key).await? {
            return Ok(false);
        }
        self.objects.delete(&key).await?;
        Ok(true)
    }
}
