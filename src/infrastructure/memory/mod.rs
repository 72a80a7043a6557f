//! Memory Layer - 进程内状态
//!
//! 单进程部署使用的任务队列、一次性合成产物缓存，以及测试用的对象存储

mod artifact_cache;
mod job_queue;
mod object_store;

pub use artifact_cache::FifoArtifactCache;
pub use job_queue::InMemoryJobQueue;
pub use object_store::InMemoryObjectStore;
