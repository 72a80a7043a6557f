//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, BlobBackend, QueueBackend};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `NARRAVOX_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `NARRAVOX_STORAGE__BLOB_BACKEND=remote`
/// - `NARRAVOX_STORAGE__REMOTE__BUCKET=voices`
/// - `NARRAVOX_ENGINE__URL=http://engine:8000`
/// - `NARRAVOX_QUEUE__BACKEND=sqlite`
///
/// # 返回
/// - `Ok(AppConfig)` - 成功加载的配置
/// - `Err(ConfigError)` - 加载失败
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("storage.blob_backend", "local")?
        .set_default("storage.metadata_backend", "flat_file")?
        .set_default("storage.voices_dir", "data/voices")?
        .set_default("storage.remote.timeout_secs", 30)?
        .set_default("database.path", "data/narravox.db")?
        .set_default("database.max_connections", 5)?
        .set_default("engine.url", "http://localhost:8000")?
        .set_default("engine.timeout_secs", 120)?
        .set_default("engine.fake", false)?
        .set_default("clone.min_duration_secs", 3.0)?
        .set_default("clone.max_duration_secs", 120.0)?
        .set_default("clone.pending_dir", "data/pending")?
        .set_default("narration.result_dir", "data/results")?
        .set_default("narration.chunk_concurrency", 1)?
        .set_default("queue.backend", "none")?
        .set_default("queue.capacity", 1000)?
        .set_default("queue.worker_concurrency", 1)?
        .set_default("queue.poll_interval_ms", 500)?
        .set_default("cache.capacity", 10)?
        .set_default("cache.dir", "data/cache")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        // 搜索默认配置文件
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: NARRAVOX_
    // 层级分隔符: __ (双下划线)
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("NARRAVOX")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let invalid = |msg: &str| Err(ConfigError::ValidationError(msg.to_string()));

    if config.storage.blob_backend == BlobBackend::Remote
        && (config.storage.remote.endpoint.trim().is_empty()
            || config.storage.remote.bucket.trim().is_empty())
    {
        return invalid("Remote blob backend requires storage.remote.endpoint and storage.remote.bucket");
    }

    if config.needs_database() && config.database.path.is_empty() {
        return invalid("Database path cannot be empty");
    }

    // 数据库只有 SQLite 实现
    let db_path = config.database.path.trim_start().to_ascii_lowercase();
    if config.needs_database()
        && (db_path.starts_with("postgres://") || db_path.starts_with("postgresql://"))
    {
        return invalid("PostgreSQL is not supported; database.path must be a SQLite file path");
    }

    if !config.engine.fake && config.engine.url.is_empty() {
        return invalid("Engine URL cannot be empty");
    }

    let (min, max) = (config.clone.min_duration_secs, config.clone.max_duration_secs);
    if !(min > 0.0 && min <= max) {
        return invalid("Clone duration limits must satisfy 0 < min <= max");
    }

    if config.cache.capacity == 0 {
        return invalid("Cache capacity must be greater than 0");
    }

    if config.queue.capacity == 0 {
        return invalid("Queue capacity must be greater than 0");
    }

    if config.queue.worker_concurrency == 0 {
        return invalid("Worker concurrency must be greater than 0");
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!(
        "Voice Storage: blob={:?} metadata={:?}",
        config.storage.blob_backend,
        config.storage.metadata_backend
    );
    match config.storage.blob_backend {
        BlobBackend::Local => tracing::info!("Voices Directory: {:?}", config.storage.voices_dir),
        BlobBackend::Remote => tracing::info!(
            "Object Store: {}/{}",
            config.storage.remote.endpoint,
            config.storage.remote.bucket
        ),
    }
    if config.needs_database() {
        tracing::info!("Database: {}", config.database.path);
        tracing::info!("Database Max Connections: {}", config.database.max_connections);
    }
    if config.engine.fake {
        tracing::info!("Engine: fake");
    } else {
        tracing::info!("Engine URL: {}", config.engine.url);
        tracing::info!("Engine Timeout: {}s", config.engine.timeout_secs);
    }
    tracing::info!(
        "Clone Duration: {:.1}s..{:.1}s",
        config.clone.min_duration_secs,
        config.clone.max_duration_secs
    );
    tracing::info!("Queue Backend: {:?}", config.queue.backend);
    if config.queue.backend != QueueBackend::None {
        tracing::info!("Worker Concurrency: {}", config.queue.worker_concurrency);
        tracing::info!("Result Directory: {:?}", config.narration.result_dir);
    }
    tracing::info!("Artifact Cache: {} files in {:?}", config.cache.capacity, config.cache.dir);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::MetadataBackend;

    #[test]
    fn test_validation_passes_for_default_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_remote_backend_requires_bucket() {
        let mut config = AppConfig::default();
        config.storage.blob_backend = BlobBackend::Remote;
        config.storage.remote.endpoint = "http://minio:9000".to_string();
        assert!(validate_config(&config).is_err());

        config.storage.remote.bucket = "voices".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_inverted_durations() {
        let mut config = AppConfig::default();
        config.clone.min_duration_secs = 10.0;
        config.clone.max_duration_secs = 5.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_capacity() {
        let mut config = AppConfig::default();
        config.cache.capacity = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_postgres_url_is_rejected() {
        let mut config = AppConfig::default();
        config.storage.metadata_backend = MetadataBackend::Relational;
        config.database.path = "postgresql://voices@db/narravox".to_string();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("PostgreSQL is not supported"));

        // 不使用数据库时不检查
        config.storage.metadata_backend = MetadataBackend::FlatFile;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_sqlite_queue_requires_db_path() {
        let mut config = AppConfig::default();
        config.queue.backend = QueueBackend::Sqlite;
        config.database.path = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("narravox.toml");
        std::fs::write(
            &path,
            "[storage]\nmetadata_backend = \"relational\"\n\n[queue]\nbackend = \"memory\"\ncapacity = 4\n",
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert_eq!(config.storage.metadata_backend, MetadataBackend::Relational);
        assert_eq!(config.queue.backend, QueueBackend::Memory);
        assert_eq!(config.queue.capacity, 4);
        assert_eq!(config.cache.capacity, 10);
    }
}
