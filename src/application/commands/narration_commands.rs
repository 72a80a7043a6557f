//! Narration Commands

use std::path::PathBuf;

use crate::domain::chunker::DEFAULT_CHUNK_CHARS;
use crate::domain::voice::OwnerId;

/// 长文本旁白；同步执行与入队共用同一结构
#[derive(Debug, Clone)]
pub struct Narrate {
    pub text: String,
    pub voice_id: Option<String>,
    /// `sentence` / `paragraph` / `fixed`，无法识别时按 sentence 处理
    pub chunk_mode: String,
    pub max_chars: usize,
}

impl Narrate {
    pub fn new(text: impl Into<String>, voice_id: Option<String>) -> Self {
        Self {
            text: text.into(),
            voice_id,
            chunk_mode: "sentence".to_string(),
            max_chars: DEFAULT_CHUNK_CHARS,
        }
    }
}

/// 入队克隆任务，上传内容会先落盘到 pending 目录
#[derive(Debug, Clone)]
pub struct EnqueueClone {
    pub audio: Vec<u8>,
    /// 原始文件扩展名（含点），为空或不是纯字母数字时使用 `.wav`
    pub file_suffix: String,
    pub consent_scope: String,
    pub name: Option<String>,
    pub owner_id: Option<OwnerId>,
    pub faction: Option<String>,
}

/// 一次性合成使用的音色
#[derive(Debug, Clone)]
pub enum VoiceRef {
    /// 已保存的音色
    Stored(String),
    /// 请求内临时提供的参考音频，调用方负责清理
    Reference(PathBuf),
}

/// 一次性合成
#[derive(Debug, Clone)]
pub struct Synthesize {
    pub text: String,
    pub voice: VoiceRef,
}
