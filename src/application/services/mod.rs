//! Application Services - 跨端口的用例服务
//!
//! - VoiceStore: 音色存储门面
//! - ClonePipeline: 克隆流程
//! - NarrationRenderer: 分块合成与拼接

mod clone_pipeline;
mod narration_renderer;
mod voice_store;

pub use clone_pipeline::{validate_duration, CloneRequest, ClonePipeline, DurationLimits};
pub use narration_renderer::{
    validate_narration, NarrationRenderer, RenderedNarration, ValidatedNarration,
};
pub use voice_store::VoiceStore;
