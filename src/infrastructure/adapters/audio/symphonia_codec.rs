//! Symphonia Codec - 基于 symphonia 的音频探测与 WAV 封装
//!
//! - 时长：优先使用容器声明的帧数，没有时完整解码计数
//! - 输出：16-bit PCM 单声道 WAV

use async_trait::async_trait;
use std::fs::File;
use std::path::{Path, PathBuf};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioCodecPort, CodecError};

#[derive(Debug, Clone, Default)]
pub struct SymphoniaCodec;

impl SymphoniaCodec {
    pub fn new() -> Self {
        Self
    }
}

/// 同步探测，在 blocking 线程中调用
fn measure_duration_blocking(path: &Path) -> Result<f64, CodecError> {
    let file = File::open(path).map_err(|e| CodecError::IoError(e.to_string()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let detected = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| CodecError::DecodeError(format!("Unrecognized audio format: {}", e)))?;
    let mut format = detected.format;

    let track = format
        .default_track()
        .ok_or_else(|| CodecError::DecodeError("No audio track found".to_string()))?;
    let sample_rate = track
        .codec_params
        .sample_rate
        .filter(|r| *r > 0)
        .ok_or_else(|| CodecError::DecodeError("Unknown sample rate".to_string()))?;

    if let Some(frames) = track.codec_params.n_frames {
        return Ok(frames as f64 / sample_rate as f64);
    }

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| CodecError::DecodeError(format!("Decoder creation failed: {}", e)))?;
    let track_id = track.id;
    let mut frames: u64 = 0;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(e) => {
                return Err(CodecError::DecodeError(format!("Packet read error: {}", e)));
            }
        };
        if packet.track_id() != track_id {
            continue;
        }
        match decoder.decode(&packet) {
            Ok(decoded) => frames += decoded.frames() as u64,
            Err(e) => tracing::warn!("Decode error (skipping packet): {}", e),
        }
    }

    Ok(frames as f64 / sample_rate as f64)
}

#[async_trait]
impl AudioCodecPort for SymphoniaCodec {
    async fn measure_duration(&self, path: &Path) -> Result<f64, CodecError> {
        let path: PathBuf = path.to_path_buf();
        tokio::task::spawn_blocking(move || measure_duration_blocking(&path))
            .await
            .map_err(|e| CodecError::DecodeError(format!("Duration task failed: {}", e)))?
    }

    fn encode_wav(&self, samples: &[f32], sample_rate: u32) -> Result<Vec<u8>, CodecError> {
        if sample_rate == 0 {
            return Err(CodecError::EncodeError("Sample rate must be positive".to_string()));
        }

        let bits_per_sample: u16 = 16;
        let num_channels: u16 = 1;
        let byte_rate = sample_rate * num_channels as u32 * (bits_per_sample / 8) as u32;
        let block_align = num_channels * (bits_per_sample / 8);

        let data_size = samples.len() * 2;
        let riff_size = u32::try_from(36 + data_size)
            .map_err(|_| CodecError::EncodeError("Audio too large for WAV".to_string()))?;

        let mut wav = Vec::with_capacity(44 + data_size);

        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&riff_size.to_le_bytes());
        wav.extend_from_slice(b"WAVE");

        wav.extend_from_slice(b"fmt ");
        wav.extend_from_slice(&16u32.to_le_bytes());
        wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
        wav.extend_from_slice(&num_channels.to_le_bytes());
        wav.extend_from_slice(&sample_rate.to_le_bytes());
        wav.extend_from_slice(&byte_rate.to_le_bytes());
        wav.extend_from_slice(&block_align.to_le_bytes());
        wav.extend_from_slice(&bits_per_sample.to_le_bytes());

        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&(data_size as u32).to_le_bytes());

        for &s in samples {
            let pcm = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            wav.extend_from_slice(&pcm.to_le_bytes());
        }

        Ok(wav)
    }
}
