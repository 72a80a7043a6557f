//! Voice Commands

use std::path::PathBuf;

use crate::domain::voice::OwnerId;

/// 同步克隆音色；`audio_path` 由调用方负责清理
#[derive(Debug, Clone)]
pub struct CreateVoice {
    pub audio_path: PathBuf,
    pub consent_scope: String,
    pub name: Option<String>,
    pub owner_id: Option<OwnerId>,
    pub faction: Option<String>,
}

/// 更新音色名称
#[derive(Debug, Clone)]
pub struct UpdateVoice {
    pub voice_id: String,
    pub name: Option<String>,
    pub owner_id: Option<OwnerId>,
}

/// 删除音色；`owner_id` 为空表示管理员下架
#[derive(Debug, Clone)]
pub struct DeleteVoice {
    pub voice_id: String,
    pub owner_id: Option<OwnerId>,
}
