//! Voice Context - 音色记录

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use super::{OwnerId, VoiceId};

/// 默认授权范围
pub const DEFAULT_CONSENT_SCOPE: &str = "tts";

/// 音色元数据记录
///
/// 不变量:
/// - `voice_id` 与 `created_at` 创建后不可变
/// - 只有 `name` 允许修改
/// - `owner_id` 为空表示历史遗留的公共音色
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceRecord {
    pub voice_id: VoiceId,
    pub name: String,
    pub consent_scope: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<OwnerId>,
    #[serde(default)]
    pub faction: Option<String>,
}

impl VoiceRecord {
    /// 创建新记录，名称去首尾空白，空的授权范围回退为 `tts`，空阵营视为无
    pub fn new(
        voice_id: VoiceId,
        name: impl Into<String>,
        consent_scope: impl Into<String>,
        owner_id: Option<OwnerId>,
        faction: Option<String>,
    ) -> Self {
        let consent_scope = consent_scope.into();
        let consent_scope = if consent_scope.trim().is_empty() {
            DEFAULT_CONSENT_SCOPE.to_string()
        } else {
            consent_scope.trim().to_string()
        };

        Self {
            voice_id,
            name: name.into().trim().to_string(),
            consent_scope,
            // 精确到微秒，各后端读回的值完全一致
            created_at: Utc::now().trunc_subsecs(6),
            owner_id,
            faction: faction
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty()),
        }
    }

    /// 所有权判定
    ///
    /// 未提供 owner（管理员视角）、记录无主、或者所有者一致时可见。
    /// 不可见时调用方必须表现得与记录不存在完全一致。
    pub fn is_visible_to(&self, owner: Option<&OwnerId>) -> bool {
        match (owner, &self.owner_id) {
            (None, _) => true,
            (Some(_), None) => true,
            (Some(caller), Some(recorded)) => caller == recorded,
        }
    }
}

/// 列表排序：创建时间倒序，时间相同按 id 保证稳定
pub fn sort_newest_first(records: &mut [VoiceRecord]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.voice_id.cmp(&b.voice_id))
    });
}
