//! Fake Voice Engine - 用于测试和本地开发的确定性引擎
//!
//! 不调用任何外部服务，相同输入总是产出相同采样。

use async_trait::async_trait;
use std::path::Path;

use crate::application::ports::{EngineError, SynthesizedAudio, VoiceEnginePort};
use crate::domain::voice::VoiceBlob;

/// 每个字符产出的采样数
const SAMPLES_PER_CHAR: usize = 4;

pub struct FakeVoiceEngine {
    fail: bool,
}

impl FakeVoiceEngine {
    pub const SAMPLE_RATE: u32 = 16_000;

    pub fn new() -> Self {
        Self { fail: false }
    }

    /// 所有调用都返回错误
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl Default for FakeVoiceEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VoiceEnginePort for FakeVoiceEngine {
    async fn embed(&self, audio_path: &Path) -> Result<VoiceBlob, EngineError> {
        if self.fail {
            return Err(EngineError::ServiceError("fake engine configured to fail".to_string()));
        }
        let audio = tokio::fs::read(audio_path)
            .await
            .map_err(|e| EngineError::ServiceError(format!("Cannot read audio: {}", e)))?;

        let checksum = audio.iter().fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(*b as u32));
        Ok(VoiceBlob::new(
            format!("fake-voice:{}:{:08x}", audio.len(), checksum).into_bytes(),
        ))
    }

    async fn synthesize(
        &self,
        voice: &VoiceBlob,
        text: &str,
    ) -> Result<SynthesizedAudio, EngineError> {
        if self.fail {
            return Err(EngineError::ServiceError("fake engine configured to fail".to_string()));
        }

        let bias = (voice.len() % 7) as f32 / 100.0;
        let samples = text
            .chars()
            .flat_map(|c| {
                let level = (c as u32 % 97) as f32 / 97.0 - 0.5 + bias;
                std::iter::repeat(level.clamp(-1.0, 1.0)).take(SAMPLES_PER_CHAR)
            })
            .collect();

        Ok(SynthesizedAudio {
            samples,
            sample_rate: Self::SAMPLE_RATE,
        })
    }
}
