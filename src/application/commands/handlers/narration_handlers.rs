//! Narration Command Handlers
//!
//! 同步旁白、异步入队（旁白 / 克隆）、一次性合成。

use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{EnqueueClone, Narrate, Synthesize, VoiceRef};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    ArtifactCachePort, ArtifactStorePort, JobQueuePort, VoiceEnginePort,
};
use crate::application::services::{validate_narration, NarrationRenderer, ValidatedNarration};
use crate::domain::chunker::{ChunkMode, MAX_TOTAL_CHARS};
use crate::domain::narration::{JobId, JobKind, NarrationJob};
use crate::domain::voice::VoiceId;

fn validate(command: &Narrate) -> Result<ValidatedNarration, ApplicationError> {
    validate_narration(
        &command.text,
        command.voice_id.as_deref(),
        ChunkMode::parse_lenient(&command.chunk_mode),
        command.max_chars,
    )
}

fn require_queue(
    queue: &Option<Arc<dyn JobQueuePort>>,
) -> Result<&Arc<dyn JobQueuePort>, ApplicationError> {
    queue
        .as_ref()
        .ok_or_else(|| ApplicationError::QueueUnavailable("No queue backend configured".to_string()))
}

// ============================================================================
// Narrate (sync)
// ============================================================================

/// 同步旁白响应
#[derive(Debug, Clone)]
pub struct NarrateResponse {
    pub wav: Vec<u8>,
    pub chunk_count: usize,
    pub sample_rate: u32,
}

/// Narrate Handler
pub struct NarrateHandler {
    renderer: Arc<NarrationRenderer>,
}

impl NarrateHandler {
    pub fn new(renderer: Arc<NarrationRenderer>) -> Self {
        Self { renderer }
    }

    pub async fn handle(&self, command: Narrate) -> Result<NarrateResponse, ApplicationError> {
        let validated = validate(&command)?;
        let rendered = self
            .renderer
            .render(&validated.voice_id, &validated.chunks)
            .await?;

        tracing::info!(
            voice_id = %validated.voice_id,
            chunks = rendered.chunk_count,
            samples = rendered.sample_count,
            "Narration rendered"
        );

        Ok(NarrateResponse {
            wav: rendered.wav,
            chunk_count: rendered.chunk_count,
            sample_rate: rendered.sample_rate,
        })
    }
}

// ============================================================================
// EnqueueNarration
// ============================================================================

/// EnqueueNarration Handler
pub struct EnqueueNarrationHandler {
    queue: Option<Arc<dyn JobQueuePort>>,
}

impl EnqueueNarrationHandler {
    pub fn new(queue: Option<Arc<dyn JobQueuePort>>) -> Self {
        Self { queue }
    }

    pub async fn handle(&self, command: Narrate) -> Result<JobId, ApplicationError> {
        let validated = validate(&command)?;
        let queue = require_queue(&self.queue)?;

        let job = NarrationJob::new(JobKind::Narrate {
            text: validated.text,
            voice_id: validated.voice_id,
            chunk_mode: validated.chunk_mode,
            max_chars: validated.max_chars,
        });
        let job_id = queue.enqueue(job).await?;

        tracing::info!(
            job_id = %job_id,
            voice_id = %validated.voice_id,
            chunks = validated.chunks.len(),
            "Narration job enqueued"
        );
        Ok(job_id)
    }
}

// ============================================================================
// EnqueueClone
// ============================================================================

/// 上传文件扩展名
///
/// 只接受 1 到 8 位 ASCII 字母数字，其余情况一律使用 `wav`，
/// 保证上传文件始终落在 pending 目录内。
fn upload_extension(suffix: &str) -> String {
    let ext = suffix.strip_prefix('.').unwrap_or(suffix);
    if (1..=8).contains(&ext.len()) && ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
        ext.to_ascii_lowercase()
    } else {
        "wav".to_string()
    }
}

/// EnqueueClone Handler
pub struct EnqueueCloneHandler {
    queue: Option<Arc<dyn JobQueuePort>>,
    pending_dir: PathBuf,
}

impl EnqueueCloneHandler {
    pub fn new(queue: Option<Arc<dyn JobQueuePort>>, pending_dir: impl Into<PathBuf>) -> Self {
        Self {
            queue,
            pending_dir: pending_dir.into(),
        }
    }

    pub async fn handle(&self, command: EnqueueClone) -> Result<JobId, ApplicationError> {
        if command.audio.is_empty() {
            return Err(ApplicationError::invalid_input("No file"));
        }
        let queue = require_queue(&self.queue)?;

        let upload_path = self
            .pending_dir
            .join(format!("{}.{}", Uuid::new_v4(), upload_extension(&command.file_suffix)));

        tokio::fs::create_dir_all(&self.pending_dir)
            .await
            .map_err(|e| ApplicationError::Storage(e.to_string()))?;
        tokio::fs::write(&upload_path, &command.audio)
            .await
            .map_err(|e| ApplicationError::Storage(e.to_string()))?;

        let job = NarrationJob::new(JobKind::Clone {
            upload_path: upload_path.clone(),
            consent_scope: command.consent_scope,
            name: command.name,
            owner_id: command.owner_id,
            faction: command.faction,
        });

        match queue.enqueue(job).await {
            Ok(job_id) => {
                tracing::info!(job_id = %job_id, upload = %upload_path.display(), "Clone job enqueued");
                Ok(job_id)
            }
            Err(e) => {
                // 入队失败时上传文件不会再有人处理
                if let Err(rm) = tokio::fs::remove_file(&upload_path).await {
                    tracing::warn!(upload = %upload_path.display(), error = %rm, "Failed to remove pending upload");
                }
                Err(e.into())
            }
        }
    }
}

// ============================================================================
// Synthesize (one-shot)
// ============================================================================

/// 一次性合成响应
#[derive(Debug, Clone)]
pub struct SynthesizeResponse {
    pub path: PathBuf,
    pub sample_rate: u32,
}

/// Synthesize Handler
///
/// 产物登记到有界缓存，超出容量时最早的文件被删除。
pub struct SynthesizeHandler {
    renderer: Arc<NarrationRenderer>,
    engine: Arc<dyn VoiceEnginePort>,
    artifacts: Arc<dyn ArtifactStorePort>,
    cache: Arc<dyn ArtifactCachePort>,
}

impl SynthesizeHandler {
    pub fn new(
        renderer: Arc<NarrationRenderer>,
        engine: Arc<dyn VoiceEnginePort>,
        artifacts: Arc<dyn ArtifactStorePort>,
        cache: Arc<dyn ArtifactCachePort>,
    ) -> Self {
        Self {
            renderer,
            engine,
            artifacts,
            cache,
        }
    }

    pub async fn handle(&self, command: Synthesize) -> Result<SynthesizeResponse, ApplicationError> {
        let text = command.text.trim();
        if text.is_empty() {
            return Err(ApplicationError::invalid_input("No text"));
        }
        if text.chars().count() > MAX_TOTAL_CHARS {
            return Err(ApplicationError::invalid_input(format!(
                "Text exceeds {} characters",
                MAX_TOTAL_CHARS
            )));
        }
        let chunks = [text.to_string()];

        let rendered = match &command.voice {
            VoiceRef::Stored(raw) => {
                let voice_id =
                    VoiceId::parse(raw).ok_or_else(|| ApplicationError::not_found("Voice", raw))?;
                self.renderer.render(&voice_id, &chunks).await?
            }
            VoiceRef::Reference(path) => {
                let blob = self.engine.embed(path).await.map_err(|e| {
                    ApplicationError::ExtractionFailed(format!("Voice extraction failed: {}", e))
                })?;
                self.renderer.render_with_blob(&blob, &chunks).await?
            }
        };

        let file_name = format!("{}.wav", Uuid::new_v4());
        let path = self.artifacts.save(&file_name, &rendered.wav).await?;
        if let Some(evicted) = self.cache.insert(path.clone()).await {
            tracing::debug!(evicted = %evicted.display(), "Artifact evicted");
        }

        Ok(SynthesizeResponse {
            path,
            sample_rate: rendered.sample_rate,
        })
    }
}
