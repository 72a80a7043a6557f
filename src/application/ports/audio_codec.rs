//! Audio Codec Port - 音频探测与封装

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Decode error: {0}")]
    DecodeError(String),

    #[error("Encode error: {0}")]
    EncodeError(String),
}

#[async_trait]
pub trait AudioCodecPort: Send + Sync {
    /// 解码音频并返回时长（秒）
    async fn measure_duration(&self, path: &Path) -> Result<f64, CodecError>;

    /// 把单声道浮点采样封装为 16-bit PCM WAV
    fn encode_wav(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, CodecError>;
}
