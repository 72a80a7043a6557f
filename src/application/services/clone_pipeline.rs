//! Clone Pipeline - 从音频样本创建音色
//!
//! 流程：测量时长 -> 引擎提取音色表示 -> 分配 voice_id 并经门面持久化。
//! 临时上传文件由调用方清理。

use std::path::PathBuf;
use std::sync::Arc;

use super::VoiceStore;
use crate::application::error::ApplicationError;
use crate::application::ports::{AudioCodecPort, VoiceEnginePort};
use crate::domain::voice::{OwnerId, VoiceId, VoiceRecord};

/// 时长限制（秒）
#[derive(Debug, Clone, Copy)]
pub struct DurationLimits {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Default for DurationLimits {
    fn default() -> Self {
        Self {
            min_secs: 3.0,
            max_secs: 120.0,
        }
    }
}

/// 时长校验，闭区间 `[min, max]`
pub fn validate_duration(duration: f64, limits: DurationLimits) -> Result<(), ApplicationError> {
    if duration < limits.min_secs {
        return Err(ApplicationError::invalid_audio(format!(
            "Audio too short: {:.1}s (min {:.1}s)",
            duration, limits.min_secs
        )));
    }
    if duration > limits.max_secs {
        return Err(ApplicationError::invalid_audio(format!(
            "Audio too long: {:.1}s (max {:.1}s)",
            duration, limits.max_secs
        )));
    }
    Ok(())
}

/// 克隆请求
#[derive(Debug, Clone)]
pub struct CloneRequest {
    pub audio_path: PathBuf,
    pub consent_scope: String,
    pub name: Option<String>,
    pub owner_id: Option<OwnerId>,
    pub faction: Option<String>,
}

pub struct ClonePipeline {
    store: VoiceStore,
    engine: Arc<dyn VoiceEnginePort>,
    codec: Arc<dyn AudioCodecPort>,
    limits: DurationLimits,
}

impl ClonePipeline {
    pub fn new(
        store: VoiceStore,
        engine: Arc<dyn VoiceEnginePort>,
        codec: Arc<dyn AudioCodecPort>,
        limits: DurationLimits,
    ) -> Self {
        Self {
            store,
            engine,
            codec,
            limits,
        }
    }

    pub async fn clone_voice(&self, request: CloneRequest) -> Result<VoiceId, ApplicationError> {
        let duration = self
            .codec
            .measure_duration(&request.audio_path)
            .await
            .map_err(|e| ApplicationError::invalid_audio(format!("Could not load audio: {}", e)))?;

        validate_duration(duration, self.limits)?;

        let blob = self
            .engine
            .embed(&request.audio_path)
            .await
            .map_err(|e| ApplicationError::ExtractionFailed(format!("Voice extraction failed: {}", e)))?;

        let voice_id = self.store.create_id();
        let record = VoiceRecord::new(
            voice_id,
            request.name.unwrap_or_default(),
            request.consent_scope,
            request.owner_id,
            request.faction,
        );
        self.store.save(&record, &blob).await?;

        tracing::info!(
            voice_id = %voice_id,
            duration_secs = duration,
            "Voice cloned"
        );
        Ok(voice_id)
    }
}
