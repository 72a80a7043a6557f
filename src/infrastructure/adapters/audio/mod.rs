//! Audio Adapter - 音频探测与封装

mod symphonia_codec;

pub use symphonia_codec::SymphoniaCodec;
