//! HTTP Voice Engine - 调用外部合成引擎 HTTP 服务
//!
//! 外部引擎 API:
//! POST {base}/api/voice/embed        multipart: audio=<file>
//!   Response: application/octet-stream，音色表示原样返回
//! POST {base}/api/tts/synthesize     multipart: voice=<bytes>, text=<string>
//!   Response: 小端 f32 单声道 PCM，采样率在 X-TTS-Sample-Rate 头中

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

use crate::application::ports::{EngineError, SynthesizedAudio, VoiceEnginePort};
use crate::domain::voice::VoiceBlob;

const SAMPLE_RATE_HEADER: &str = "X-TTS-Sample-Rate";

/// HTTP 引擎客户端配置
#[derive(Debug, Clone)]
pub struct HttpVoiceEngineConfig {
    /// 引擎服务基础 URL
    pub base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpVoiceEngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
        }
    }
}

impl HttpVoiceEngineConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP 引擎客户端
pub struct HttpVoiceEngine {
    client: Client,
    config: HttpVoiceEngineConfig,
}

impl HttpVoiceEngine {
    pub fn new(config: HttpVoiceEngineConfig) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EngineError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn embed_url(&self) -> String {
        format!("{}/api/voice/embed", self.config.base_url)
    }

    fn synthesize_url(&self) -> String {
        format!("{}/api/tts/synthesize", self.config.base_url)
    }

    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url)
    }

    async fn post(&self, url: String, form: Form) -> Result<reqwest::Response, EngineError> {
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::Timeout
                } else if e.is_connect() {
                    EngineError::NetworkError(format!("Cannot connect to engine: {}", e))
                } else {
                    EngineError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(EngineError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }
        Ok(response)
    }
}

/// 解析小端 f32 PCM
pub(crate) fn decode_f32_le(bytes: &[u8]) -> Result<Vec<f32>, EngineError> {
    if bytes.len() % 4 != 0 {
        return Err(EngineError::InvalidResponse(format!(
            "PCM payload length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

#[async_trait]
impl VoiceEnginePort for HttpVoiceEngine {
    async fn embed(&self, audio_path: &Path) -> Result<VoiceBlob, EngineError> {
        let audio = tokio::fs::read(audio_path)
            .await
            .map_err(|e| EngineError::ServiceError(format!("Cannot read audio: {}", e)))?;
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "sample.wav".to_string());

        tracing::debug!(url = %self.embed_url(), bytes = audio.len(), "Sending embed request");

        let form = Form::new().part("audio", Part::bytes(audio).file_name(file_name));
        let response = self.post(self.embed_url(), form).await?;
        let blob = response
            .bytes()
            .await
            .map_err(|e| EngineError::InvalidResponse(format!("Failed to read voice: {}", e)))?
            .to_vec();

        if blob.is_empty() {
            return Err(EngineError::InvalidResponse("Empty voice representation".to_string()));
        }
        Ok(VoiceBlob::new(blob))
    }

    async fn synthesize(
        &self,
        voice: &VoiceBlob,
        text: &str,
    ) -> Result<SynthesizedAudio, EngineError> {
        let form = Form::new()
            .part("voice", Part::bytes(voice.as_bytes().to_vec()).file_name("voice.bin"))
            .text("text", text.to_string());

        let response = self.post(self.synthesize_url(), form).await?;
        let sample_rate: u32 = response
            .headers()
            .get(SAMPLE_RATE_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| {
                EngineError::InvalidResponse(format!("Missing {} header", SAMPLE_RATE_HEADER))
            })?;

        let payload = response
            .bytes()
            .await
            .map_err(|e| EngineError::InvalidResponse(format!("Failed to read audio: {}", e)))?;
        let samples = decode_f32_le(&payload)?;

        tracing::debug!(
            text_len = text.len(),
            sample_rate,
            samples = samples.len(),
            "Engine synthesis completed"
        );
        Ok(SynthesizedAudio {
            samples,
            sample_rate,
        })
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(&self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
