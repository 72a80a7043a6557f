//! SQLite Job Queue - 跨进程共享的旁白任务队列
//!
//! 提交进程与 worker 进程通过同一个数据库文件协作。
//! 领取使用单条 `UPDATE ... RETURNING`，同一任务只会被一个 worker 拿到。

use async_trait::async_trait;
use chrono::Utc;
use sqlx::FromRow;

use super::{format_timestamp, parse_timestamp, DbPool};
use crate::application::ports::{JobQueuePort, QueueError};
use crate::domain::narration::{JobId, JobKind, JobOutcome, JobState, NarrationJob};

/// SQLite 任务队列
pub struct SqliteJobQueue {
    pool: DbPool,
}

impl SqliteJobQueue {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// 终态更新没有命中任何行时，区分任务不存在与已经结束
    async fn explain_missed_transition(&self, id: JobId) -> QueueError {
        match self.get(id).await {
            Ok(Some(job)) => QueueError::InvalidStateTransition(format!(
                "job {} already {}",
                id,
                job.state.as_str()
            )),
            Ok(None) => QueueError::NotFound(id),
            Err(e) => e,
        }
    }
}

#[derive(FromRow)]
struct JobRow {
    job_id: String,
    payload: String,
    status: String,
    outcome: Option<String>,
    error: Option<String>,
    created_at: String,
    completed_at: Option<String>,
}

impl TryFrom<JobRow> for NarrationJob {
    type Error = QueueError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let corrupt = |what: &str, detail: String| {
            QueueError::Backend(format!("corrupt job row {}: {} ({})", row.job_id, what, detail))
        };

        let job_id = JobId::parse(&row.job_id)
            .ok_or_else(|| corrupt("job_id", row.job_id.clone()))?;
        let kind: JobKind =
            serde_json::from_str(&row.payload).map_err(|e| corrupt("payload", e.to_string()))?;
        let state =
            JobState::from_str(&row.status).ok_or_else(|| corrupt("status", row.status.clone()))?;
        let outcome = row
            .outcome
            .as_deref()
            .map(serde_json::from_str::<JobOutcome>)
            .transpose()
            .map_err(|e| corrupt("outcome", e.to_string()))?;
        let created_at =
            parse_timestamp(&row.created_at).map_err(|e| corrupt("created_at", e.to_string()))?;
        let completed_at = row
            .completed_at
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .map_err(|e| corrupt("completed_at", e.to_string()))?;

        Ok(NarrationJob {
            job_id,
            kind,
            state,
            outcome,
            error: row.error,
            created_at,
            completed_at,
        })
    }
}

const RETURNING_COLUMNS: &str = "job_id, payload, status, outcome, error, created_at, completed_at";

#[async_trait]
impl JobQueuePort for SqliteJobQueue {
    async fn enqueue(&self, job: NarrationJob) -> Result<JobId, QueueError> {
        let payload =
            serde_json::to_string(&job.kind).map_err(|e| QueueError::Backend(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO narration_jobs (job_id, kind, payload, status, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(job.job_id.to_string())
        .bind(job.kind.label())
        .bind(payload)
        .bind(job.state.as_str())
        .bind(format_timestamp(&job.created_at))
        .execute(&self.pool)
        .await
        // 提交方据此退回同步路径
        .map_err(|e| QueueError::Unavailable(e.to_string()))?;

        tracing::debug!(job_id = %job.job_id, kind = job.kind.label(), "Job enqueued");
        Ok(job.job_id)
    }

    async fn claim_next(&self) -> Result<Option<NarrationJob>, QueueError> {
        let row: Option<JobRow> = sqlx::query_as(&format!(
            r#"
            UPDATE narration_jobs
            SET claimed_at = ?
            WHERE job_id = (
                SELECT job_id FROM narration_jobs
                WHERE status = 'pending' AND claimed_at IS NULL
                ORDER BY created_at ASC
                LIMIT 1
            )
            RETURNING {}
            "#,
            RETURNING_COLUMNS
        ))
        .bind(format_timestamp(&Utc::now()))
        .fetch_optional(&self.pool)
        .await?;

        row.map(NarrationJob::try_from).transpose()
    }

    async fn mark_completed(&self, id: JobId, outcome: JobOutcome) -> Result<(), QueueError> {
        let outcome =
            serde_json::to_string(&outcome).map_err(|e| QueueError::Backend(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE narration_jobs
            SET status = 'completed', outcome = ?, completed_at = ?
            WHERE job_id = ? AND status = 'pending'
            "#,
        )
        .bind(outcome)
        .bind(format_timestamp(&Utc::now()))
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.explain_missed_transition(id).await);
        }
        Ok(())
    }

    async fn mark_failed(&self, id: JobId, error: String) -> Result<(), QueueError> {
        let result = sqlx::query(
            r#"
            UPDATE narration_jobs
            SET status = 'failed', error = ?, completed_at = ?
            WHERE job_id = ? AND status = 'pending'
            "#,
        )
        .bind(error)
        .bind(format_timestamp(&Utc::now()))
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(self.explain_missed_transition(id).await);
        }
        Ok(())
    }

    async fn get(&self, id: JobId) -> Result<Option<NarrationJob>, QueueError> {
        let row: Option<JobRow> = sqlx::query_as(&format!(
            "SELECT {} FROM narration_jobs WHERE job_id = ?",
            RETURNING_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(NarrationJob::try_from).transpose()
    }
}
