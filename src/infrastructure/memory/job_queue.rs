//! In-Memory Job Queue Implementation

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{mpsc, Mutex};

use crate::application::ports::{JobQueuePort, QueueError};
use crate::domain::narration::{JobId, JobOutcome, JobState, JobTransitionError, NarrationJob};

/// 内存任务队列
///
/// 任务记录放在 DashMap，待处理顺序由有界 channel 维护。
/// 队列满时入队失败，提交方可以退回同步路径。
pub struct InMemoryJobQueue {
    /// job_id -> NarrationJob
    jobs: DashMap<JobId, NarrationJob>,
    /// 任务队列发送端
    queue_sender: mpsc::Sender<JobId>,
    queue_receiver: Mutex<mpsc::Receiver<JobId>>,
}

impl InMemoryJobQueue {
    pub fn new(capacity: usize) -> Self {
        let (queue_sender, queue_receiver) = mpsc::channel(capacity.max(1));
        Self {
            jobs: DashMap::new(),
            queue_sender,
            queue_receiver: Mutex::new(queue_receiver),
        }
    }

    fn transition(
        &self,
        id: JobId,
        apply: impl FnOnce(&mut NarrationJob) -> Result<(), JobTransitionError>,
    ) -> Result<(), QueueError> {
        let mut job = self.jobs.get_mut(&id).ok_or(QueueError::NotFound(id))?;
        let old_state = job.state;
        apply(&mut *job).map_err(|e| QueueError::InvalidStateTransition(e.to_string()))?;

        tracing::debug!(
            job_id = %id,
            old_state = ?old_state,
            new_state = ?job.state,
            "Job state changed"
        );
        Ok(())
    }
}

#[async_trait]
impl JobQueuePort for InMemoryJobQueue {
    async fn enqueue(&self, job: NarrationJob) -> Result<JobId, QueueError> {
        let job_id = job.job_id;
        let kind = job.kind.label();
        self.jobs.insert(job_id, job);

        // 发送到队列
        if let Err(e) = self.queue_sender.try_send(job_id) {
            self.jobs.remove(&job_id);
            tracing::warn!(job_id = %job_id, error = %e, "Failed to enqueue job");
            return Err(QueueError::Unavailable(e.to_string()));
        }

        tracing::debug!(job_id = %job_id, kind, "Job enqueued");
        Ok(job_id)
    }

    async fn claim_next(&self) -> Result<Option<NarrationJob>, QueueError> {
        let mut receiver = self.queue_receiver.lock().await;

        // 跳过已被直接置为终态的任务
        while let Ok(job_id) = receiver.try_recv() {
            match self.jobs.get(&job_id) {
                Some(job) if job.state == JobState::Pending => return Ok(Some(job.clone())),
                _ => continue,
            }
        }
        Ok(None)
    }

    async fn mark_completed(&self, id: JobId, outcome: JobOutcome) -> Result<(), QueueError> {
        self.transition(id, |job| job.complete(outcome))
    }

    async fn mark_failed(&self, id: JobId, error: String) -> Result<(), QueueError> {
        self.transition(id, |job| job.fail(error))
    }

    async fn get(&self, id: JobId) -> Result<Option<NarrationJob>, QueueError> {
        Ok(self.jobs.get(&id).map(|j| j.clone()))
    }
}
