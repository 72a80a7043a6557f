//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Voice Context: 音色身份
//! - Narration Context: 旁白任务

pub mod narration;
pub mod voice;

// 共享的旁白分块器
pub mod chunker;

pub use chunker::{split_for_narration, ChunkMode};
