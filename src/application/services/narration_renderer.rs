//! Narration Renderer - 分块合成与拼接
//!
//! 同步路径与 worker 共用同一套算法：
//! 先解析音色（解析失败立即返回 NotFound，不调用引擎），
//! 再按分块顺序合成，最后按原始顺序拼接为一个 WAV。

use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;

use super::VoiceStore;
use crate::application::error::ApplicationError;
use crate::application::ports::{AudioCodecPort, VoiceEnginePort};
use crate::domain::chunker::{split_for_narration, ChunkMode, MAX_TOTAL_CHARS};
use crate::domain::voice::{VoiceBlob, VoiceId};

/// 通过校验的旁白输入
#[derive(Debug, Clone)]
pub struct ValidatedNarration {
    pub text: String,
    pub voice_id: VoiceId,
    pub chunk_mode: ChunkMode,
    pub max_chars: usize,
    pub chunks: Vec<String>,
}

/// 旁白输入校验，同步与异步路径共用
///
/// 检查顺序：文本非空、总长度、分块结果、音色标识。
/// 音色标识格式不合法按 NotFound 处理。
pub fn validate_narration(
    text: &str,
    voice_id: Option<&str>,
    chunk_mode: ChunkMode,
    max_chars: usize,
) -> Result<ValidatedNarration, ApplicationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ApplicationError::invalid_input("No text"));
    }
    if trimmed.chars().count() > MAX_TOTAL_CHARS {
        return Err(ApplicationError::invalid_input(format!(
            "Text exceeds {} characters",
            MAX_TOTAL_CHARS
        )));
    }

    let chunks = split_for_narration(trimmed, chunk_mode, max_chars);
    if chunks.is_empty() {
        return Err(ApplicationError::invalid_input("No chunks produced from text"));
    }

    let raw_id = voice_id
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApplicationError::invalid_input("Narrate requires a voice_id"))?;
    let voice_id = VoiceId::parse(raw_id).ok_or_else(|| ApplicationError::not_found("Voice", raw_id))?;

    Ok(ValidatedNarration {
        text: trimmed.to_string(),
        voice_id,
        chunk_mode,
        max_chars,
        chunks,
    })
}

/// 合成结果
#[derive(Debug, Clone)]
pub struct RenderedNarration {
    pub wav: Vec<u8>,
    pub sample_rate: u32,
    pub sample_count: usize,
    pub chunk_count: usize,
}

pub struct NarrationRenderer {
    store: VoiceStore,
    engine: Arc<dyn VoiceEnginePort>,
    codec: Arc<dyn AudioCodecPort>,
    /// 同时在途的分块数，1 表示严格串行
    chunk_concurrency: usize,
}

impl NarrationRenderer {
    pub fn new(
        store: VoiceStore,
        engine: Arc<dyn VoiceEnginePort>,
        codec: Arc<dyn AudioCodecPort>,
        chunk_concurrency: usize,
    ) -> Self {
        Self {
            store,
            engine,
            codec,
            chunk_concurrency: chunk_concurrency.max(1),
        }
    }

    /// 用已保存的音色合成
    pub async fn render(
        &self,
        voice_id: &VoiceId,
        chunks: &[String],
    ) -> Result<RenderedNarration, ApplicationError> {
        let blob = self.store.load_blob(voice_id).await?;
        self.render_with_blob(&blob, chunks).await
    }

    /// 用给定的音色表示合成
    pub async fn render_with_blob(
        &self,
        blob: &VoiceBlob,
        chunks: &[String],
    ) -> Result<RenderedNarration, ApplicationError> {
        // 每个分块的 future 持有自己的引擎与音色句柄，可以跨任务 spawn
        let blob = Arc::new(blob.clone());

        // buffered 按输入顺序产出，与完成顺序无关
        let parts: Vec<_> = stream::iter(chunks.iter().cloned().enumerate())
            .map(|(index, chunk)| {
                let engine = Arc::clone(&self.engine);
                let blob = Arc::clone(&blob);
                async move {
                    tracing::debug!(index, chars = chunk.chars().count(), "Synthesizing chunk");
                    engine
                        .synthesize(&blob, &chunk)
                        .await
                        .map_err(|e| ApplicationError::GenerationFailed(e.to_string()))
                }
            })
            .buffered(self.chunk_concurrency)
            .try_collect()
            .await?;

        let sample_rate = match parts.first() {
            Some(first) => first.sample_rate,
            None => return Err(ApplicationError::invalid_input("No chunks produced from text")),
        };
        if let Some(mismatch) = parts.iter().find(|p| p.sample_rate != sample_rate) {
            return Err(ApplicationError::GenerationFailed(format!(
                "Sample rate changed between chunks: {} vs {}",
                sample_rate, mismatch.sample_rate
            )));
        }

        let samples: Vec<f32> = parts.into_iter().flat_map(|p| p.samples).collect();
        let wav = self
            .codec
            .encode_wav(&samples, sample_rate)
            .map_err(|e| ApplicationError::GenerationFailed(e.to_string()))?;

        Ok(RenderedNarration {
            wav,
            sample_rate,
            sample_count: samples.len(),
            chunk_count: chunks.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::SynthesizedAudio;
    use crate::domain::voice::VoiceRecord;
    use crate::infrastructure::adapters::audio::SymphoniaCodec;
    use crate::infrastructure::adapters::engine::FakeVoiceEngine;
    use crate::infrastructure::adapters::storage::LocalBlobStore;
    use crate::infrastructure::persistence::flat_file::LocalSidecarStore;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    async fn store_with_voice(dir: &Path) -> (VoiceStore, VoiceId) {
        let store = VoiceStore::new(
            Arc::new(LocalBlobStore::new(dir)),
            Arc::new(LocalSidecarStore::new(dir)),
        );
        let id = store.create_id();
        let record = VoiceRecord::new(id, "Narrator", "tts", None, None);
        store
            .save(&record, &VoiceBlob::new(b"voice-state".to_vec()))
            .await
            .unwrap();
        (store, id)
    }

    #[test]
    fn test_validation_order_and_messages() {
        let id = VoiceId::new().to_string();
        let long = "a".repeat(5001);
        let cases = [
            ("   ", Some(id.as_str()), "InvalidInput: No text"),
            (long.as_str(), Some(id.as_str()), "InvalidInput: Text exceeds 5000 characters"),
            ("Hello.", None, "InvalidInput: Narrate requires a voice_id"),
            ("Hello.", Some("  "), "InvalidInput: Narrate requires a voice_id"),
        ];
        for (text, voice, expected) in cases {
            let err = validate_narration(text, voice, ChunkMode::Sentence, 500).unwrap_err();
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn test_malformed_voice_id_is_not_found() {
        let err = validate_narration("Hello.", Some("not-a-uuid"), ChunkMode::Sentence, 500).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_validation_produces_chunks() {
        let id = VoiceId::new();
        let v = validate_narration("One. Two.", Some(&id.to_string()), ChunkMode::Sentence, 500).unwrap();
        assert_eq!(v.chunks, vec!["One. Two.".to_string()]);
        assert_eq!(v.voice_id, id);
    }

    #[tokio::test]
    async fn test_render_equals_manual_concatenation() {
        let dir = tempdir().unwrap();
        let (store, id) = store_with_voice(dir.path()).await;
        let engine = Arc::new(FakeVoiceEngine::new());
        let codec = Arc::new(SymphoniaCodec::new());
        let renderer = NarrationRenderer::new(store, engine.clone(), codec.clone(), 4);

        let chunks: Vec<String> = ["First chunk.", "Second, longer chunk here.", "Third."]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rendered = renderer.render(&id, &chunks).await.unwrap();

        let blob = VoiceBlob::new(b"voice-state".to_vec());
        let mut expected = Vec::new();
        for chunk in &chunks {
            expected.extend(engine.synthesize(&blob, chunk).await.unwrap().samples);
        }
        let expected_wav = codec.encode_wav(&expected, FakeVoiceEngine::SAMPLE_RATE).unwrap();

        assert_eq!(rendered.wav, expected_wav);
        assert_eq!(rendered.chunk_count, 3);
        assert_eq!(rendered.sample_count, expected.len());
    }

    #[tokio::test]
    async fn test_render_runs_on_spawned_task() {
        let dir = tempdir().unwrap();
        let (store, id) = store_with_voice(dir.path()).await;
        let renderer = Arc::new(NarrationRenderer::new(
            store,
            Arc::new(FakeVoiceEngine::new()),
            Arc::new(SymphoniaCodec::new()),
            2,
        ));

        let chunks = vec!["Alpha.".to_string(), "Beta.".to_string()];
        let expected = renderer.render(&id, &chunks).await.unwrap();

        let spawned = tokio::spawn({
            let renderer = renderer.clone();
            async move { renderer.render(&id, &chunks).await }
        });
        let rendered = spawned.await.unwrap().unwrap();
        assert_eq!(rendered.wav, expected.wav);
        assert_eq!(rendered.chunk_count, 2);
    }

    struct CountingEngine {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VoiceEnginePort for CountingEngine {
        async fn embed(&self, _: &Path) -> Result<VoiceBlob, crate::application::ports::EngineError> {
            Ok(VoiceBlob::new(vec![]))
        }

        async fn synthesize(
            &self,
            _: &VoiceBlob,
            text: &str,
        ) -> Result<SynthesizedAudio, crate::application::ports::EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // 第二段返回不同采样率
            let rate = if text.starts_with("two") { 22050 } else { 16000 };
            Ok(SynthesizedAudio {
                samples: vec![0.0; 10],
                sample_rate: rate,
            })
        }
    }

    #[tokio::test]
    async fn test_unknown_voice_fails_before_engine_call() {
        let dir = tempdir().unwrap();
        let (store, _) = store_with_voice(dir.path()).await;
        let engine = Arc::new(CountingEngine {
            calls: AtomicUsize::new(0),
        });
        let renderer = NarrationRenderer::new(store, engine.clone(), Arc::new(SymphoniaCodec::new()), 1);

        let err = renderer
            .render(&VoiceId::new(), &["hello".to_string()])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sample_rate_mismatch_is_generation_failure() {
        let dir = tempdir().unwrap();
        let (store, id) = store_with_voice(dir.path()).await;
        let engine = Arc::new(CountingEngine {
            calls: AtomicUsize::new(0),
        });
        let renderer = NarrationRenderer::new(store, engine, Arc::new(SymphoniaCodec::new()), 1);

        let err = renderer
            .render(&id, &["one".to_string(), "two".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::GenerationFailed(_)));
    }

    #[tokio::test]
    async fn test_engine_failure_is_generation_failure() {
        let dir = tempdir().unwrap();
        let (store, id) = store_with_voice(dir.path()).await;
        let renderer = NarrationRenderer::new(
            store,
            Arc::new(FakeVoiceEngine::failing()),
            Arc::new(SymphoniaCodec::new()),
            2,
        );

        let err = renderer.render(&id, &["hello".to_string()]).await.unwrap_err();
        assert!(matches!(err, ApplicationError::GenerationFailed(_)));
    }
}
