//! Persistence Layer - 数据持久化
//!
//! 扁平文件元数据（本地或对象存储）与 SQLite 关系型元数据、任务队列

pub mod flat_file;
pub mod sqlite;
