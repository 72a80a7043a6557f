//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 音色存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 合成引擎配置
    #[serde(default)]
    pub engine: EngineConfig,

    /// 克隆配置
    #[serde(default)]
    pub clone: CloneConfig,

    /// 旁白配置
    #[serde(default)]
    pub narration: NarrationConfig,

    /// 任务队列配置
    #[serde(default)]
    pub queue: QueueConfig,

    /// 一次性合成产物缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// 是否需要打开 SQLite
    pub fn needs_database(&self) -> bool {
        self.storage.metadata_backend == MetadataBackend::Relational
            || self.queue.backend == QueueBackend::Sqlite
    }
}

/// blob 后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobBackend {
    #[default]
    Local,
    Remote,
}

/// 元数据后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataBackend {
    /// 与 blob 放在一起的 JSON 文件
    #[default]
    FlatFile,
    Relational,
}

/// 音色存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub blob_backend: BlobBackend,

    #[serde(default)]
    pub metadata_backend: MetadataBackend,

    /// 本地 blob 与扁平元数据目录
    #[serde(default = "default_voices_dir")]
    pub voices_dir: PathBuf,

    /// 远程对象存储
    #[serde(default)]
    pub remote: RemoteStorageConfig,
}

fn default_voices_dir() -> PathBuf {
    PathBuf::from("data/voices")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            blob_backend: BlobBackend::default(),
            metadata_backend: MetadataBackend::default(),
            voices_dir: default_voices_dir(),
            remote: RemoteStorageConfig::default(),
        }
    }
}

/// 远程对象存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteStorageConfig {
    #[serde(default)]
    pub endpoint: String,

    #[serde(default)]
    pub bucket: String,

    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "default_remote_timeout")]
    pub timeout_secs: u64,
}

fn default_remote_timeout() -> u64 {
    30
}

impl Default for RemoteStorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            bucket: String::new(),
            access_token: None,
            timeout_secs: default_remote_timeout(),
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite 文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/narravox.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// 合成引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// 引擎服务基础 URL
    #[serde(default = "default_engine_url")]
    pub url: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_engine_timeout")]
    pub timeout_secs: u64,

    /// 使用确定性的假引擎，本地联调用
    #[serde(default)]
    pub fake: bool,
}

fn default_engine_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_engine_timeout() -> u64 {
    120
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: default_engine_url(),
            timeout_secs: default_engine_timeout(),
            fake: false,
        }
    }
}

/// 克隆配置
#[derive(Debug, Clone, Deserialize)]
pub struct CloneConfig {
    #[serde(default = "default_min_duration")]
    pub min_duration_secs: f64,

    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f64,

    /// 排队克隆的上传文件暂存目录
    #[serde(default = "default_pending_dir")]
    pub pending_dir: PathBuf,
}

fn default_min_duration() -> f64 {
    3.0
}

fn default_max_duration() -> f64 {
    120.0
}

fn default_pending_dir() -> PathBuf {
    PathBuf::from("data/pending")
}

impl Default for CloneConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: default_min_duration(),
            max_duration_secs: default_max_duration(),
            pending_dir: default_pending_dir(),
        }
    }
}

/// 旁白配置
#[derive(Debug, Clone, Deserialize)]
pub struct NarrationConfig {
    /// 队列旁白结果目录
    #[serde(default = "default_result_dir")]
    pub result_dir: PathBuf,

    /// 同时在途的分块数
    #[serde(default = "default_chunk_concurrency")]
    pub chunk_concurrency: usize,
}

fn default_result_dir() -> PathBuf {
    PathBuf::from("data/results")
}

fn default_chunk_concurrency() -> usize {
    1
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            result_dir: default_result_dir(),
            chunk_concurrency: default_chunk_concurrency(),
        }
    }
}

/// 队列后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueBackend {
    /// 不提供异步路径
    #[default]
    None,
    /// 进程内，worker 与提交方同进程
    Memory,
    /// 共享数据库，worker 可以是独立进程
    Sqlite,
}

/// 任务队列配置
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    #[serde(default)]
    pub backend: QueueBackend,

    /// 内存队列容量
    #[serde(default = "default_queue_capacity")]
    pub capacity: usize,

    #[serde(default = "default_worker_concurrency")]
    pub worker_concurrency: usize,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_worker_concurrency() -> usize {
    1
}

fn default_poll_interval() -> u64 {
    500
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: QueueBackend::default(),
            capacity: default_queue_capacity(),
            worker_concurrency: default_worker_concurrency(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

/// 产物缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
}

fn default_cache_capacity() -> usize {
    10
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("data/cache")
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            dir: default_cache_dir(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否使用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
