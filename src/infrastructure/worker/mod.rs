//! Worker Layer - Background Job Processing
//!
//! 实现 JobWorker，消费旁白与克隆任务

mod job_worker;

pub use job_worker::{JobWorker, JobWorkerConfig};
