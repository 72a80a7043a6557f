//! Voice Queries

use crate::domain::voice::OwnerId;

/// 获取音色详情查询
#[derive(Debug, Clone)]
pub struct GetVoice {
    pub voice_id: String,
    pub owner_id: Option<OwnerId>,
}

/// 列出音色查询
#[derive(Debug, Clone, Default)]
pub struct ListVoices {
    pub owner_id: Option<OwnerId>,
}
