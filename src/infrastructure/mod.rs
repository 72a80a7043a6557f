//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod backends;
pub mod memory;
pub mod persistence;
pub mod state;
pub mod worker;

pub use backends::{assemble_voice_store, build_voice_store, BlobLocation, BootstrapError};
pub use memory::{FifoArtifactCache, InMemoryJobQueue, InMemoryObjectStore};
pub use state::AppState;
pub use worker::{JobWorker, JobWorkerConfig};
