use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::audio_models::{InputSource, PcmFormat};

/// Result returned when a capture session completes successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    /// PCM payload length, excluding the 44-byte header.
    pub data_bytes: u64,
    pub duration_secs: f64,
    /// Lowercase hex SHA-256 of the container file.
    pub checksum: String,
    pub metadata: RecordingMetadata,
}

/// Metadata describing a finished recording.
///
/// Serializable for the optional JSON sidecar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub file_path: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub input_source: InputSource,
    pub data_bytes: u64,
    pub duration_secs: f64,
    pub checksum: String,
}

impl RecordingMetadata {
    pub fn new(
        format: PcmFormat,
        input_source: InputSource,
        file_path: &str,
        data_bytes: u64,
        checksum: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            file_path: file_path.to_string(),
            sample_rate: format.sample_rate,
            channels: format.channels,
            bits_per_sample: format.bits_per_sample,
            input_source,
            data_bytes,
            duration_secs: format.duration_secs(data_bytes),
            checksum: checksum.to_string(),
        }
    }
}
