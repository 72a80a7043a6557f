//! SQLite Persistence - 关系型元数据与共享任务队列

mod database;
mod job_repo;
mod voice_repo;

pub use database::*;
pub use job_repo::SqliteJobQueue;
pub use voice_repo::SqliteMetadataStore;
