//! Narration Context - 任务状态机

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::chunker::ChunkMode;
use crate::domain::voice::{OwnerId, VoiceId};

/// 任务唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s.trim()).ok().map(Self)
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Completed,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(JobState::Pending),
            "completed" => Some(JobState::Completed),
            "failed" => Some(JobState::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Pending)
    }
}

/// 任务输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobKind {
    /// 长文本旁白
    Narrate {
        text: String,
        voice_id: VoiceId,
        chunk_mode: ChunkMode,
        max_chars: usize,
    },
    /// 克隆音色，上传文件由 worker 负责清理
    Clone {
        upload_path: PathBuf,
        consent_scope: String,
        name: Option<String>,
        owner_id: Option<OwnerId>,
        faction: Option<String>,
    },
}

impl JobKind {
    pub fn label(&self) -> &'static str {
        match self {
            JobKind::Narrate { .. } => "narrate",
            JobKind::Clone { .. } => "clone",
        }
    }
}

/// 任务产出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobOutcome {
    Narration { result_path: PathBuf },
    Clone { voice_id: VoiceId },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("job {job_id} already {state}")]
pub struct JobTransitionError {
    pub job_id: JobId,
    pub state: &'static str,
}

/// 旁白任务
///
/// 不变量:
/// - 创建时处于 pending
/// - 只能转换一次，到 completed 或 failed
/// - 终态不可修改
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationJob {
    pub job_id: JobId,
    pub kind: JobKind,
    pub state: JobState,
    pub outcome: Option<JobOutcome>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl NarrationJob {
    pub fn new(kind: JobKind) -> Self {
        Self {
            job_id: JobId::new(),
            kind,
            state: JobState::Pending,
            outcome: None,
            error: None,
            created_at: Utc::now().trunc_subsecs(6),
            completed_at: None,
        }
    }

    fn ensure_pending(&self) -> Result<(), JobTransitionError> {
        if self.state.is_terminal() {
            return Err(JobTransitionError {
                job_id: self.job_id,
                state: self.state.as_str(),
            });
        }
        Ok(())
    }

    pub fn complete(&mut self, outcome: JobOutcome) -> Result<(), JobTransitionError> {
        self.ensure_pending()?;
        self.state = JobState::Completed;
        self.outcome = Some(outcome);
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), JobTransitionError> {
        self.ensure_pending()?;
        self.state = JobState::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn narrate_job() -> NarrationJob {
        NarrationJob::new(JobKind::Narrate {
            text: "Hello there.".to_string(),
            voice_id: VoiceId::new(),
            chunk_mode: ChunkMode::Sentence,
            max_chars: 500,
        })
    }

    #[test]
    fn test_transitions_exactly_once() {
        let mut job = narrate_job();
        assert_eq!(job.state, JobState::Pending);

        job.complete(JobOutcome::Narration {
            result_path: PathBuf::from("/tmp/out.wav"),
        })
        .unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert!(job.completed_at.is_some());

        assert!(job.fail("late failure").is_err());
        assert_eq!(job.state, JobState::Completed);
        assert!(job.error.is_none());
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut job = narrate_job();
        job.fail("engine exploded").unwrap();
        let err = job
            .complete(JobOutcome::Clone {
                voice_id: VoiceId::new(),
            })
            .unwrap_err();
        assert_eq!(err.state, "failed");
        assert_eq!(job.error.as_deref(), Some("engine exploded"));
    }

    #[test]
    fn test_kind_payload_is_tagged() {
        let job = narrate_job();
        let json = serde_json::to_value(&job.kind).unwrap();
        assert_eq!(json["kind"], "narrate");
        assert_eq!(json["chunk_mode"], "sentence");

        let back: JobKind = serde_json::from_value(json).unwrap();
        assert_eq!(back, job.kind);
    }
}
