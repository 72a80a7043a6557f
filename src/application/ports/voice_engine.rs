//! Voice Engine Port - 合成引擎抽象
//!
//! 外部引擎提供两项能力：从参考音频提取音色表示、用音色表示合成文本。
//! 音色表示的内部结构只在引擎适配器内部可见。

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

use crate::domain::voice::VoiceBlob;

/// 引擎错误
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// 合成结果：单声道浮点采样
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Voice Engine Port
#[async_trait]
pub trait VoiceEnginePort: Send + Sync {
    /// 从参考音频提取音色表示
    async fn embed(&self, audio_path: &Path) -> Result<VoiceBlob, EngineError>;

    /// 合成一段文本
    async fn synthesize(&self, voice: &VoiceBlob, text: &str)
        -> Result<SynthesizedAudio, EngineError>;

    /// 检查引擎是否可用
    async fn health_check(&self) -> bool {
        true
    }
}
