//! Narration Context - 旁白任务限界上下文

mod job;

pub use job::{JobId, JobKind, JobOutcome, JobState, JobTransitionError, NarrationJob};
