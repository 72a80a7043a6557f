//! Voice Context - 音色限界上下文
//!
//! 职责:
//! - 音色标识与所有者
//! - 音色元数据记录与可见性规则
//! - 引擎产出的不透明音色表示

mod record;
mod value_objects;

pub use record::{sort_newest_first, VoiceRecord, DEFAULT_CONSENT_SCOPE};
pub use value_objects::{OwnerId, VoiceBlob, VoiceId};
