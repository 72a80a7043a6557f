//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod artifact_cache;
mod artifact_store;
mod audio_codec;
mod job_queue;
mod object_store;
mod repositories;
mod voice_engine;

pub use artifact_cache::ArtifactCachePort;
pub use artifact_store::ArtifactStorePort;
pub use audio_codec::{AudioCodecPort, CodecError};
pub use job_queue::{JobQueuePort, QueueError};
pub use object_store::{ObjectStoreError, ObjectStorePort};
pub use repositories::{BlobStorePort, MetadataStorePort, RepositoryError};
pub use voice_engine::{EngineError, SynthesizedAudio, VoiceEnginePort};
