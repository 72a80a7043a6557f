//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（存储、引擎、编解码、队列、缓存）
//! - services: 音色存储门面、克隆流程、旁白合成
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod services;

// Re-exports
pub use commands::{
    handlers::{
        CreateVoiceHandler, DeleteVoiceHandler, EnqueueCloneHandler, EnqueueNarrationHandler,
        NarrateHandler, NarrateResponse, SynthesizeHandler, SynthesizeResponse,
        UpdateVoiceHandler,
    },
    CreateVoice, DeleteVoice, EnqueueClone, Narrate, Synthesize, UpdateVoice, VoiceRef,
};

pub use error::ApplicationError;

pub use ports::{
    ArtifactCachePort, ArtifactStorePort, AudioCodecPort, BlobStorePort, CodecError,
    EngineError, JobQueuePort, MetadataStorePort, ObjectStoreError, ObjectStorePort, QueueError,
    RepositoryError, SynthesizedAudio, VoiceEnginePort,
};

pub use queries::{
    handlers::{
        GetJobResultHandler, GetJobStatusHandler, GetVoiceHandler, JobResultResponse,
        JobStatusResponse, ListVoicesHandler,
    },
    GetJobResult, GetJobStatus, GetVoice, ListVoices,
};

pub use services::{
    CloneRequest, ClonePipeline, DurationLimits, NarrationRenderer, VoiceStore,
};
