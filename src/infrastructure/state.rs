//! Application State
//!
//! 启动时按配置一次性组装所有端口与 Command/Query Handlers，不使用进程级全局状态。

use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    ArtifactCachePort, ArtifactStorePort, AudioCodecPort, JobQueuePort, VoiceEnginePort,
};
use crate::application::services::{ClonePipeline, DurationLimits, NarrationRenderer, VoiceStore};
use crate::application::{
    // Command handlers
    CreateVoiceHandler, DeleteVoiceHandler, EnqueueCloneHandler, EnqueueNarrationHandler,
    NarrateHandler, SynthesizeHandler, UpdateVoiceHandler,
    // Query handlers
    GetJobResultHandler, GetJobStatusHandler, GetVoiceHandler, ListVoicesHandler,
};
use crate::config::{AppConfig, BlobBackend, QueueBackend};
use crate::infrastructure::adapters::audio::SymphoniaCodec;
use crate::infrastructure::adapters::engine::{
    FakeVoiceEngine, HttpVoiceEngine, HttpVoiceEngineConfig,
};
use crate::infrastructure::adapters::storage::FileArtifactStore;
use crate::infrastructure::backends::{build_voice_store, BootstrapError};
use crate::infrastructure::memory::{FifoArtifactCache, InMemoryJobQueue};
use crate::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, DbPool, SqliteJobQueue,
};
use crate::infrastructure::worker::{JobWorker, JobWorkerConfig};

/// 应用状态
pub struct AppState {
    pub config: AppConfig,

    // ========== Ports ==========
    pub pool: Option<DbPool>,
    pub store: VoiceStore,
    pub engine: Arc<dyn VoiceEnginePort>,
    pub codec: Arc<dyn AudioCodecPort>,
    pub queue: Option<Arc<dyn JobQueuePort>>,
    pub results: Arc<dyn ArtifactStorePort>,
    pub artifact_cache: Arc<dyn ArtifactCachePort>,

    // ========== Services ==========
    pub renderer: Arc<NarrationRenderer>,
    pub pipeline: Arc<ClonePipeline>,

    // ========== Command Handlers ==========
    pub create_voice_handler: CreateVoiceHandler,
    pub update_voice_handler: UpdateVoiceHandler,
    pub delete_voice_handler: DeleteVoiceHandler,
    pub narrate_handler: NarrateHandler,
    pub enqueue_narration_handler: EnqueueNarrationHandler,
    pub enqueue_clone_handler: EnqueueCloneHandler,
    pub synthesize_handler: SynthesizeHandler,

    // ========== Query Handlers ==========
    pub get_voice_handler: GetVoiceHandler,
    pub list_voices_handler: ListVoicesHandler,
    pub job_status_handler: GetJobStatusHandler,
    pub job_result_handler: GetJobResultHandler,
}

impl AppState {
    /// 创建应用状态
    pub async fn build(config: &AppConfig) -> Result<Self, BootstrapError> {
        // 确保数据目录存在
        if config.storage.blob_backend == BlobBackend::Local {
            tokio::fs::create_dir_all(&config.storage.voices_dir).await?;
        }
        tokio::fs::create_dir_all(&config.clone.pending_dir).await?;
        tokio::fs::create_dir_all(&config.narration.result_dir).await?;
        tokio::fs::create_dir_all(&config.cache.dir).await?;

        // 初始化数据库
        let pool = if config.needs_database() {
            if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let db_config =
                DatabaseConfig::new(&config.database.path, config.database.max_connections);
            let pool = create_pool(&db_config).await?;
            run_migrations(&pool).await?;
            Some(pool)
        } else {
            None
        };

        let store = build_voice_store(&config.storage, pool.clone())?;

        let engine: Arc<dyn VoiceEnginePort> = if config.engine.fake {
            tracing::warn!("Using fake voice engine");
            Arc::new(FakeVoiceEngine::new())
        } else {
            Arc::new(HttpVoiceEngine::new(
                HttpVoiceEngineConfig::new(&config.engine.url)
                    .with_timeout(config.engine.timeout_secs),
            )?)
        };
        let codec: Arc<dyn AudioCodecPort> = Arc::new(SymphoniaCodec::new());

        let queue: Option<Arc<dyn JobQueuePort>> = match config.queue.backend {
            QueueBackend::None => None,
            QueueBackend::Memory => Some(Arc::new(InMemoryJobQueue::new(config.queue.capacity))),
            QueueBackend::Sqlite => match &pool {
                Some(pool) => Some(Arc::new(SqliteJobQueue::new(pool.clone()))),
                None => {
                    return Err(BootstrapError::Config(
                        "SQLite queue requires a database".to_string(),
                    ))
                }
            },
        };

        let results: Arc<dyn ArtifactStorePort> =
            Arc::new(FileArtifactStore::new(&config.narration.result_dir));
        let cache_files: Arc<dyn ArtifactStorePort> =
            Arc::new(FileArtifactStore::new(&config.cache.dir));
        let artifact_cache: Arc<dyn ArtifactCachePort> =
            Arc::new(FifoArtifactCache::new(config.cache.capacity));

        let renderer = Arc::new(NarrationRenderer::new(
            store.clone(),
            engine.clone(),
            codec.clone(),
            config.narration.chunk_concurrency,
        ));
        let pipeline = Arc::new(ClonePipeline::new(
            store.clone(),
            engine.clone(),
            codec.clone(),
            DurationLimits {
                min_secs: config.clone.min_duration_secs,
                max_secs: config.clone.max_duration_secs,
            },
        ));

        tracing::info!(
            queue = ?config.queue.backend,
            database = pool.is_some(),
            "Application state built"
        );

        Ok(Self {
            config: config.clone(),

            // Command handlers
            create_voice_handler: CreateVoiceHandler::new(pipeline.clone(), store.clone()),
            update_voice_handler: UpdateVoiceHandler::new(store.clone()),
            delete_voice_handler: DeleteVoiceHandler::new(store.clone()),
            narrate_handler: NarrateHandler::new(renderer.clone()),
            enqueue_narration_handler: EnqueueNarrationHandler::new(queue.clone()),
            enqueue_clone_handler: EnqueueCloneHandler::new(
                queue.clone(),
                &config.clone.pending_dir,
            ),
            synthesize_handler: SynthesizeHandler::new(
                renderer.clone(),
                engine.clone(),
                cache_files,
                artifact_cache.clone(),
            ),

            // Query handlers
            get_voice_handler: GetVoiceHandler::new(store.clone()),
            list_voices_handler: ListVoicesHandler::new(store.clone()),
            job_status_handler: GetJobStatusHandler::new(queue.clone()),
            job_result_handler: GetJobResultHandler::new(queue.clone(), results.clone()),

            // Ports
            pool,
            store,
            engine,
            codec,
            queue,
            results,
            artifact_cache,
            renderer,
            pipeline,
        })
    }

    /// 配置了队列时返回 worker
    pub fn worker(&self) -> Option<JobWorker> {
        let queue = self.queue.clone()?;
        Some(JobWorker::new(
            JobWorkerConfig {
                concurrency: self.config.queue.worker_concurrency,
                poll_interval: Duration::from_millis(self.config.queue.poll_interval_ms),
            },
            queue,
            self.renderer.clone(),
            self.pipeline.clone(),
            self.results.clone(),
        ))
    }

    /// 清理一次性产物并关闭连接池
    pub async fn shutdown(&self) {
        let removed = self.artifact_cache.clear().await;
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
        tracing::info!(removed_artifacts = removed, "Application state shut down");
    }
}
