//! Flat-file Metadata - 每个音色一个元数据文件
//!
//! 与 blob 后端放在一起：本地目录或对象存储。

mod local_sidecar;
mod object_sidecar;

pub use local_sidecar::LocalSidecarStore;
pub use object_sidecar::{ObjectSidecarStore, INDEX_KEY};
