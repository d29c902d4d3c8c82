use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::audio_models::{InputSource, PcmFormat};

/// Number of reads discarded after every device start.
pub const DEFAULT_WARMUP_BUFFERS: u32 = 2;

/// Frame buffer size as a multiple of the device minimum.
pub const DEFAULT_BUFFER_MULTIPLIER: usize = 3;

pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
pub const DEFAULT_OUTPUT_FILE: &str = "audio.wav";
pub const SPOOL_FILE: &str = "temp.pcm";

/// Configuration for a capture session.
///
/// Frozen for the lifetime of a session once `start` spawns the worker.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfiguration {
    /// Sample rate in Hz (default: 44100).
    pub sample_rate: u32,

    /// 1 = mono (default), 2 = stereo.
    pub channels: u16,

    /// 16 (default) or 8.
    pub bits_per_sample: u16,

    pub input_source: InputSource,

    /// Raw PCM spool, deleted after the container is written.
    pub spool_path: PathBuf,

    /// Final WAV container.
    pub output_path: PathBuf,

    /// Reads discarded after each start/resume (default: 2).
    pub warmup_buffers: u32,

    /// Frame buffer = device minimum × this (default: 3, minimum 3).
    pub buffer_multiplier: usize,

    /// Write a `.metadata.json` sidecar next to the container.
    pub write_metadata: bool,
}

impl CaptureConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if ![1, 2].contains(&self.channels) {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        if ![8, 16].contains(&self.bits_per_sample) {
            return Err(format!("unsupported bits per sample: {}", self.bits_per_sample));
        }
        if self.buffer_multiplier < DEFAULT_BUFFER_MULTIPLIER {
            return Err(format!(
                "buffer multiplier must be at least {}, got {}",
                DEFAULT_BUFFER_MULTIPLIER, self.buffer_multiplier
            ));
        }
        if self.spool_path.as_os_str().is_empty() || self.output_path.as_os_str().is_empty() {
            return Err("spool and output paths must be set".into());
        }
        if self.spool_path == self.output_path {
            return Err("spool path and output path must differ".into());
        }
        Ok(())
    }

    pub fn format(&self) -> PcmFormat {
        PcmFormat::new(self.sample_rate, self.channels, self.bits_per_sample)
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
            bits_per_sample: 16,
            input_source: InputSource::default(),
            spool_path: PathBuf::from(SPOOL_FILE),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            warmup_buffers: DEFAULT_WARMUP_BUFFERS,
            buffer_multiplier: DEFAULT_BUFFER_MULTIPLIER,
            write_metadata: false,
        }
    }
}

/// Options as received from a bridge caller. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitOptions {
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub bits_per_sample: Option<u16>,
    pub audio_source: Option<i32>,
    pub wav_file: Option<String>,
}

impl InitOptions {
    /// Resolve against the app's files directory. Values pass through
    /// unchanged; `CaptureConfiguration::validate` is the only gate.
    pub fn resolve(&self, files_dir: &Path) -> Result<CaptureConfiguration, String> {
        let input_source = match self.audio_source {
            Some(code) => InputSource::from_code(code)
                .ok_or_else(|| format!("unknown audio source: {}", code))?,
            None => InputSource::default(),
        };
        let file_name = self.wav_file.as_deref().unwrap_or(DEFAULT_OUTPUT_FILE);

        Ok(CaptureConfiguration {
            sample_rate: self.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE),
            channels: self.channels.unwrap_or(1),
            bits_per_sample: self.bits_per_sample.unwrap_or(16),
            input_source,
            spool_path: files_dir.join(SPOOL_FILE),
            output_path: files_dir.join(file_name),
            ..Default::default()
        })
    }
}
