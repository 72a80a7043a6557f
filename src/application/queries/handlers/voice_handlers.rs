//! Voice Query Handlers

use crate::application::error::ApplicationError;
use crate::application::queries::{GetVoice, ListVoices};
use crate::application::services::VoiceStore;
use crate::domain::voice::{VoiceId, VoiceRecord};

/// GetVoice Handler
pub struct GetVoiceHandler {
    store: VoiceStore,
}

impl GetVoiceHandler {
    pub fn new(store: VoiceStore) -> Self {
        Self { store }
    }

    pub async fn handle(&self, query: GetVoice) -> Result<VoiceRecord, ApplicationError> {
        let voice_id = VoiceId::parse(&query.voice_id)
            .ok_or_else(|| ApplicationError::not_found("Voice", &query.voice_id))?;
        self.store.get(&voice_id, query.owner_id.as_ref()).await
    }
}

/// ListVoices Handler
pub struct ListVoicesHandler {
    store: VoiceStore,
}

impl ListVoicesHandler {
    pub fn new(store: VoiceStore) -> Self {
        Self { store }
    }

    /// 创建时间倒序
    pub async fn handle(&self, query: ListVoices) -> Result<Vec<VoiceRecord>, ApplicationError> {
        self.store.list(query.owner_id.as_ref()).await
    }
}
