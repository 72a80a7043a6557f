//! Voice Command Handlers

use std::sync::Arc;

use crate::application::commands::{CreateVoice, DeleteVoice, UpdateVoice};
use crate::application::error::ApplicationError;
use crate::application::services::{CloneRequest, ClonePipeline, VoiceStore};
use crate::domain::voice::{VoiceId, VoiceRecord};

// ============================================================================
// CreateVoice
// ============================================================================

/// CreateVoice Handler
pub struct CreateVoiceHandler {
    pipeline: Arc<ClonePipeline>,
    store: VoiceStore,
}

impl CreateVoiceHandler {
    pub fn new(pipeline: Arc<ClonePipeline>, store: VoiceStore) -> Self {
        Self { pipeline, store }
    }

    pub async fn handle(&self, command: CreateVoice) -> Result<VoiceRecord, ApplicationError> {
        let owner = command.owner_id.clone();
        let voice_id = self
            .pipeline
            .clone_voice(CloneRequest {
                audio_path: command.audio_path,
                consent_scope: command.consent_scope,
                name: command.name,
                owner_id: command.owner_id,
                faction: command.faction,
            })
            .await?;

        self.store.get(&voice_id, owner.as_ref()).await
    }
}

// ============================================================================
// UpdateVoice
// ============================================================================

/// UpdateVoice Handler
pub struct UpdateVoiceHandler {
    store: VoiceStore,
}

impl UpdateVoiceHandler {
    pub fn new(store: VoiceStore) -> Self {
        Self { store }
    }

    /// 不可见或不存在时返回 NotFound
    pub async fn handle(&self, command: UpdateVoice) -> Result<VoiceRecord, ApplicationError> {
        let voice_id = VoiceId::parse(&command.voice_id)
            .ok_or_else(|| ApplicationError::not_found("Voice", &command.voice_id))?;
        let owner = command.owner_id.as_ref();

        if !self
            .store
            .update(&voice_id, command.name.as_deref(), owner)
            .await?
        {
            return Err(ApplicationError::not_found("Voice", voice_id));
        }

        self.store.get(&voice_id, owner).await
    }
}

// ============================================================================
// DeleteVoice
// ============================================================================

/// DeleteVoice Handler
pub struct DeleteVoiceHandler {
    store: VoiceStore,
}

impl DeleteVoiceHandler {
    pub fn new(store: VoiceStore) -> Self {
        Self { store }
    }

    pub async fn handle(&self, command: DeleteVoice) -> Result<(), ApplicationError> {
        let voice_id = VoiceId::parse(&command.voice_id)
            .ok_or_else(|| ApplicationError::not_found("Voice", &command.voice_id))?;

        if !self.store.delete(&voice_id, command.owner_id.as_ref()).await? {
            return Err(ApplicationError::not_found("Voice", voice_id));
        }
        Ok(())
    }
}
