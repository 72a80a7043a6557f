//! Job Worker - 后台旁白/克隆任务处理器
//!
//! 可以与提交方同进程运行（内存队列），也可以作为独立进程运行（SQLite 队列）。

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::application::error::ApplicationError;
use crate::application::ports::{ArtifactStorePort, JobQueuePort, QueueError};
use crate::application::queries::handlers::narration_file_name;
use crate::application::services::{CloneRequest, ClonePipeline, NarrationRenderer};
use crate::domain::narration::{JobId, JobKind, JobOutcome, NarrationJob};
use crate::domain::voice::VoiceId;
use crate::domain::{split_for_narration, ChunkMode};

/// Worker 配置
#[derive(Debug, Clone)]
pub struct JobWorkerConfig {
    /// 同时处理的任务数
    pub concurrency: usize,
    /// 队列为空时的轮询间隔
    pub poll_interval: Duration,
}

impl Default for JobWorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            poll_interval: Duration::from_millis(500),
        }
    }
}

struct JobProcessor {
    queue: Arc<dyn JobQueuePort>,
    renderer: Arc<NarrationRenderer>,
    pipeline: Arc<ClonePipeline>,
    artifacts: Arc<dyn ArtifactStorePort>,
}

/// 任务 Worker
///
/// 从队列领取任务、执行并写回终态。每个任务恰好转换一次。
pub struct JobWorker {
    config: JobWorkerConfig,
    processor: Arc<JobProcessor>,
}

impl JobWorker {
    pub fn new(
        config: JobWorkerConfig,
        queue: Arc<dyn JobQueuePort>,
        renderer: Arc<NarrationRenderer>,
        pipeline: Arc<ClonePipeline>,
        artifacts: Arc<dyn ArtifactStorePort>,
    ) -> Self {
        Self {
            config,
            processor: Arc::new(JobProcessor {
                queue,
                renderer,
                pipeline,
                artifacts,
            }),
        }
    }

    /// 启动 Worker，直到 `cancel` 被触发；退出前等待在途任务完成
    pub async fn run(self, cancel: CancellationToken) {
        let concurrency = self.config.concurrency.max(1);
        tracing::info!(
            concurrency,
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            "JobWorker started"
        );

        // 使用 semaphore 控制并发
        let semaphore = Arc::new(Semaphore::new(concurrency));

        loop {
            let permit = tokio::select! {
                _ = cancel.cancelled() => break,
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(p) => p,
                    Err(_) => break,
                },
            };

            match self.processor.queue.claim_next().await {
                Ok(Some(job)) => {
                    let processor = self.processor.clone();
                    tokio::spawn(async move {
                        let _permit = permit; // 持有 permit 直到任务完成
                        processor.process(job).await;
                    });
                }
                Ok(None) => {
                    drop(permit);
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
                Err(e) => {
                    drop(permit);
                    tracing::error!(error = %e, "Failed to claim job");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
            }
        }

        // 等待在途任务
        let _ = semaphore.acquire_many(concurrency as u32).await;
        tracing::info!("JobWorker stopped");
    }

    /// 领取并同步处理一个任务，队列为空返回 None
    pub async fn process_next(&self) -> Result<Option<JobId>, QueueError> {
        match self.processor.queue.claim_next().await? {
            Some(job) => {
                let job_id = job.job_id;
                self.processor.process(job).await;
                Ok(Some(job_id))
            }
            None => Ok(None),
        }
    }
}

impl JobProcessor {
    async fn process(&self, job: NarrationJob) {
        let job_id = job.job_id;
        let kind = job.kind.label();
        tracing::info!(job_id = %job_id, kind, "Processing job");

        let result = match job.kind {
            JobKind::Narrate {
                text,
                voice_id,
                chunk_mode,
                max_chars,
            } => {
                self.narrate(job_id, &text, voice_id, chunk_mode, max_chars)
                    .await
            }
            JobKind::Clone {
                upload_path,
                consent_scope,
                name,
                owner_id,
                faction,
            } => {
                let result = self
                    .pipeline
                    .clone_voice(CloneRequest {
                        audio_path: upload_path.clone(),
                        consent_scope,
                        name,
                        owner_id,
                        faction,
                    })
                    .await
                    .map(|voice_id| JobOutcome::Clone { voice_id });

                // 成功与否上传文件都不再需要
                if let Err(e) = tokio::fs::remove_file(&upload_path).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(
                            job_id = %job_id,
                            path = %upload_path.display(),
                            error = %e,
                            "Failed to remove clone upload"
                        );
                    }
                }
                result
            }
        };

        let transition = match result {
            Ok(outcome) => {
                tracing::info!(job_id = %job_id, kind, "Job completed");
                self.queue.mark_completed(job_id, outcome).await
            }
            Err(e) => {
                tracing::error!(job_id = %job_id, kind, error = %e, "Job failed");
                self.queue.mark_failed(job_id, e.to_string()).await
            }
        };

        if let Err(e) = transition {
            tracing::error!(job_id = %job_id, error = %e, "Failed to record job outcome");
        }
    }

    async fn narrate(
        &self,
        job_id: JobId,
        text: &str,
        voice_id: VoiceId,
        chunk_mode: ChunkMode,
        max_chars: usize,
    ) -> Result<JobOutcome, ApplicationError> {
        let chunks = split_for_narration(text, chunk_mode, max_chars);
        if chunks.is_empty() {
            return Err(ApplicationError::invalid_input("No chunks produced from text"));
        }

        let rendered = self.renderer.render(&voice_id, &chunks).await?;
        let result_path = self
            .artifacts
            .save(&narration_file_name(&job_id), &rendered.wav)
            .await?;

        tracing::debug!(
            job_id = %job_id,
            chunks = rendered.chunk_count,
            samples = rendered.sample_count,
            "Narration rendered"
        );
        Ok(JobOutcome::Narration { result_path })
    }
}
