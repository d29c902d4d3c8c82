use serde::{Deserialize, Serialize};

/// Device input selector handed to the frame source on configure.
///
/// Numeric codes are stable and match the values bridge callers send as
/// `audioSource`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSource {
    Default,
    Mic,
    VoiceUplink,
    VoiceDownlink,
    VoiceCall,
    Camcorder,
    #[default]
    VoiceRecognition,
    VoiceCommunication,
    Unprocessed,
    VoicePerformance,
}

impl InputSource {
    pub fn code(self) -> i32 {
        match self {
            Self::Default => 0,
            Self::Mic => 1,
            Self::VoiceUplink => 2,
            Self::VoiceDownlink => 3,
            Self::VoiceCall => 4,
            Self::Camcorder => 5,
            Self::VoiceRecognition => 6,
            Self::VoiceCommunication => 7,
            Self::Unprocessed => 9,
            Self::VoicePerformance => 10,
        }
    }

    /// Map a numeric code back to a selector. Unknown codes yield `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        let source = match code {
            0 => Self::Default,
            1 => Self::Mic,
            2 => Self::VoiceUplink,
            3 => Self::VoiceDownlink,
            4 => Self::VoiceCall,
            5 => Self::Camcorder,
            6 => Self::VoiceRecognition,
            7 => Self::VoiceCommunication,
            9 => Self::Unprocessed,
            10 => Self::VoicePerformance,
            _ => return None,
        };
        Some(source)
    }
}

/// Uncompressed PCM stream layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl PcmFormat {
    pub fn new(sample_rate: u32, channels: u16, bits_per_sample: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
        }
    }

    /// Bytes per second: `sample_rate * channels * bits_per_sample / 8`.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.channels as u32 * self.bits_per_sample as u32 / 8
    }

    /// Bytes per sample frame across all channels.
    pub fn block_align(&self) -> u16 {
        self.channels * self.bits_per_sample / 8
    }

    /// Playback length of `data_bytes` of audio in this format.
    pub fn duration_secs(&self, data_bytes: u64) -> f64 {
        match self.byte_rate() {
            0 => 0.0,
            rate => data_bytes as f64 / rate as f64,
        }
    }
}

/// Counters for debugging capture sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureDiagnostics {
    pub reads: u64,
    pub empty_reads: u64,
    pub warmup_skipped: u64,
    pub frames_emitted: u64,
    pub bytes_spooled: u64,
    pub device_starts: u64,
    pub device_stops: u64,
}
