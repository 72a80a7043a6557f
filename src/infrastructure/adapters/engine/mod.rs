//! Engine Adapter - 合成引擎客户端

mod fake_voice_engine;
mod http_voice_engine;

pub use fake_voice_engine::FakeVoiceEngine;
pub use http_voice_engine::{HttpVoiceEngine, HttpVoiceEngineConfig};
