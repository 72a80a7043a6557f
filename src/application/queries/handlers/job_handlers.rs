//! Job Query Handlers
//!
//! 状态查询只读任务表，不触发任何合成。

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{ArtifactStorePort, JobQueuePort};
use crate::application::queries::{GetJobResult, GetJobStatus};
use crate::domain::narration::{JobId, JobOutcome, JobState, NarrationJob};
use crate::domain::voice::VoiceId;

/// 任务状态响应
#[derive(Debug, Clone, PartialEq)]
pub struct JobStatusResponse {
    pub job_id: JobId,
    pub status: JobState,
    /// 克隆任务完成后的音色
    pub voice_id: Option<VoiceId>,
    /// 旁白任务完成后的产物
    pub result_path: Option<PathBuf>,
    pub error: Option<String>,
}

impl From<NarrationJob> for JobStatusResponse {
    fn from(job: NarrationJob) -> Self {
        let (voice_id, result_path) = match job.outcome {
            Some(JobOutcome::Clone { voice_id }) => (Some(voice_id), None),
            Some(JobOutcome::Narration { result_path }) => (None, Some(result_path)),
            None => (None, None),
        };
        Self {
            job_id: job.job_id,
            status: job.state,
            voice_id,
            result_path,
            error: job.error,
        }
    }
}

async fn load_job(
    queue: &Option<Arc<dyn JobQueuePort>>,
    raw_id: &str,
) -> Result<NarrationJob, ApplicationError> {
    let not_found = || ApplicationError::not_found("Job", raw_id);

    let queue = queue.as_ref().ok_or_else(not_found)?;
    let job_id = JobId::parse(raw_id).ok_or_else(not_found)?;
    queue.get(job_id).await?.ok_or_else(not_found)
}

/// GetJobStatus Handler
pub struct GetJobStatusHandler {
    queue: Option<Arc<dyn JobQueuePort>>,
}

impl GetJobStatusHandler {
    pub fn new(queue: Option<Arc<dyn JobQueuePort>>) -> Self {
        Self { queue }
    }

    pub async fn handle(&self, query: GetJobStatus) -> Result<JobStatusResponse, ApplicationError> {
        Ok(load_job(&self.queue, &query.job_id).await?.into())
    }
}

/// 旁白产物
#[derive(Debug, Clone)]
pub struct JobResultResponse {
    pub job_id: JobId,
    pub path: PathBuf,
}

/// GetJobResult Handler
///
/// 仅当任务是已完成的旁白任务且产物文件存在时返回，其余一律 NotFound。
/// 产物按 job_id 定位，可重复获取。
pub struct GetJobResultHandler {
    queue: Option<Arc<dyn JobQueuePort>>,
    results: Arc<dyn ArtifactStorePort>,
}

impl GetJobResultHandler {
    pub fn new(queue: Option<Arc<dyn JobQueuePort>>, results: Arc<dyn ArtifactStorePort>) -> Self {
        Self { queue, results }
    }

    pub async fn handle(&self, query: GetJobResult) -> Result<JobResultResponse, ApplicationError> {
        let job = load_job(&self.queue, &query.job_id).await?;

        let is_completed_narration = job.state == JobState::Completed
            && matches!(job.outcome, Some(JobOutcome::Narration { .. }));
        if !is_completed_narration {
            return Err(ApplicationError::not_found("Job result", job.job_id));
        }

        let path = self
            .results
            .locate(&narration_file_name(&job.job_id))
            .await
            .ok_or_else(|| ApplicationError::not_found("Job result", job.job_id))?;

        Ok(JobResultResponse {
            job_id: job.job_id,
            path,
        })
    }
}

/// 队列旁白产物的文件名
pub fn narration_file_name(job_id: &JobId) -> String {
    format!("{}.wav", job_id)
}
