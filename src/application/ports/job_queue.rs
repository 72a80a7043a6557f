//! Job Queue Port - 旁白任务队列
//!
//! 提交方只负责入队与查询状态，合成工作由独立的 worker 完成。

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::narration::{JobId, JobOutcome, NarrationJob};

/// 队列错误
#[derive(Debug, Error)]
pub enum QueueError {
    /// 队列已满、已关闭或后端不可达
    #[error("Queue unavailable: {0}")]
    Unavailable(String),

    #[error("Job not found: {0}")]
    NotFound(JobId),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for QueueError {
    fn from(err: sqlx::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Job Queue Port
#[async_trait]
pub trait JobQueuePort: Send + Sync {
    /// 入队一个 pending 任务
    async fn enqueue(&self, job: NarrationJob) -> Result<JobId, QueueError>;

    /// 领取下一个待处理任务，没有时立即返回 None
    async fn claim_next(&self) -> Result<Option<NarrationJob>, QueueError>;

    /// pending -> completed
    async fn mark_completed(&self, id: JobId, outcome: JobOutcome) -> Result<(), QueueError>;

    /// pending -> failed
    async fn mark_failed(&self, id: JobId, error: String) -> Result<(), QueueError>;

    /// 查询任务
    async fn get(&self, id: JobId) -> Result<Option<NarrationJob>, QueueError>;
}
