//! Narravox - 音色身份存储与长文本旁白合成
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Voice Context: 音色身份与所有权
//! - Narration Context: 旁白任务状态机
//! - 旁白分块器
//!
//! 应用层 (application/):
//! - Ports: 端口定义（BlobStore, MetadataStore, ObjectStore, VoiceEngine, AudioCodec, JobQueue, ArtifactCache）
//! - Services: VoiceStore, ClonePipeline, NarrationRenderer
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: 合成引擎、音频编解码、本地/远程存储
//! - Persistence: 扁平文件元数据 + SQLite
//! - Memory: 内存队列、产物缓存
//! - Worker: JobWorker 后台任务处理
//! - State: AppState 组装

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
