//! 应用层错误定义
//!
//! 统一的命令/查询错误类型。所有端口错误在边界处收敛为这里的封闭枚举，
//! 调用方只需按种类分支。

use thiserror::Error;

use crate::application::ports::{QueueError, RepositoryError};

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 输入不合法（文本、分块参数、缺少音色等），总是在任何副作用之前返回
    #[error("InvalidInput: {0}")]
    InvalidInput(String),

    /// 克隆样本无法解码或时长越界
    #[error("InvalidAudio: {0}")]
    InvalidAudio(String),

    /// 资源不存在；所有权不匹配时同样返回此错误
    #[error("NotFound: {resource_type} {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// 引擎提取音色失败
    #[error("ExtractionFailed: {0}")]
    ExtractionFailed(String),

    /// 引擎合成失败
    #[error("GenerationFailed: {0}")]
    GenerationFailed(String),

    /// 请求了异步路径但队列不可用，调用方可以退回同步路径
    #[error("QueueUnavailable: {0}")]
    QueueUnavailable(String),

    /// 存储后端错误
    #[error("Storage: {0}")]
    Storage(String),
}

impl ApplicationError {
    /// 创建 NotFound 错误
    pub fn not_found(resource_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// 创建输入错误
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// 创建音频错误
    pub fn invalid_audio(message: impl Into<String>) -> Self {
        Self::InvalidAudio(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<QueueError> for ApplicationError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Unavailable(msg) => Self::QueueUnavailable(msg),
            QueueError::NotFound(id) => Self::not_found("Job", id),
            other => Self::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_kind_prefix() {
        let err = ApplicationError::invalid_audio("Audio too short: 1.0s (min 3.0s)");
        assert_eq!(err.to_string(), "InvalidAudio: Audio too short: 1.0s (min 3.0s)");

        let err = ApplicationError::invalid_input("Narrate requires a voice_id");
        assert_eq!(err.to_string(), "InvalidInput: Narrate requires a voice_id");
    }

    #[test]
    fn test_queue_errors_map_to_kinds() {
        let err: ApplicationError = QueueError::Unavailable("full".into()).into();
        assert!(matches!(err, ApplicationError::QueueUnavailable(_)));

        let err: ApplicationError = QueueError::Backend("boom".into()).into();
        assert!(matches!(err, ApplicationError::Storage(_)));
    }
}
