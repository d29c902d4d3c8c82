//! WAV container encoding.
//!
//! Generates the standard 44-byte RIFF header for uncompressed PCM and turns a
//! raw PCM spool into a complete container after recording finishes.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::models::audio_models::PcmFormat;
use crate::models::error::CaptureError;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Largest payload a 32-bit RIFF chunk size can describe.
pub const MAX_DATA_SIZE: u64 = u32::MAX as u64 - 36;

const PCM_FORMAT_CODE: u16 = 1;
const FMT_CHUNK_SIZE: u32 = 16;

/// Generate a 44-byte WAV RIFF header.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * bits / 8
/// [32-33]  block_align = channels * bits / 8
/// [34-35]  bits_per_sample
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn encode_header(data_size: u32, format: &PcmFormat) -> [u8; WAV_HEADER_SIZE] {
    let chunk_size = 36 + data_size;

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&FMT_CHUNK_SIZE.to_le_bytes());
    header[20..22].copy_from_slice(&PCM_FORMAT_CODE.to_le_bytes());
    header[22..24].copy_from_slice(&format.channels.to_le_bytes());
    header[24..28].copy_from_slice(&format.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&format.byte_rate().to_le_bytes());
    header[32..34].copy_from_slice(&format.block_align().to_le_bytes());
    header[34..36].copy_from_slice(&format.bits_per_sample.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Fields read back from a 44-byte header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub chunk_size: u32,
    pub format: PcmFormat,
    pub byte_rate: u32,
    pub block_align: u16,
    pub data_size: u32,
}

/// Parse the canonical 44-byte header written by [`encode_header`].
pub fn decode_header(bytes: &[u8]) -> Result<WavHeader, CaptureError> {
    if bytes.len() < WAV_HEADER_SIZE {
        return Err(CaptureError::EncodingFailed(format!(
            "header too short: {} bytes",
            bytes.len()
        )));
    }
    if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(CaptureError::EncodingFailed("missing RIFF/WAVE markers".into()));
    }
    if &bytes[12..16] != b"fmt " || &bytes[36..40] != b"data" {
        return Err(CaptureError::EncodingFailed("missing fmt/data chunk markers".into()));
    }
    if read_u16(bytes, 20) != PCM_FORMAT_CODE {
        return Err(CaptureError::EncodingFailed(format!(
            "unsupported audio format code: {}",
            read_u16(bytes, 20)
        )));
    }

    Ok(WavHeader {
        chunk_size: read_u32(bytes, 4),
        format: PcmFormat::new(read_u32(bytes, 24), read_u16(bytes, 22), read_u16(bytes, 34)),
        byte_rate: read_u32(bytes, 28),
        block_align: read_u16(bytes, 32),
        data_size: read_u32(bytes, 40),
    })
}

/// Write `header` followed by every byte of `raw`, unchanged.
///
/// Returns the number of payload bytes copied.
pub fn materialize<R: Read, W: Write>(
    mut raw: R,
    header: &[u8; WAV_HEADER_SIZE],
    mut out: W,
) -> io::Result<u64> {
    out.write_all(header)?;
    let copied = io::copy(&mut raw, &mut out)?;
    out.flush()?;
    Ok(copied)
}

/// Build the container at `output_path` from the raw spool.
///
/// The container is written to a `.part` sibling and renamed into place, so a
/// failure never leaves a truncated file at `output_path`. Returns the payload
/// length.
pub fn write_container(
    spool_path: &Path,
    format: &PcmFormat,
    output_path: &Path,
) -> Result<u64, CaptureError> {
    let spool = File::open(spool_path)
        .map_err(|e| CaptureError::StorageError(format!("failed to open spool: {}", e)))?;
    let data_len = spool
        .metadata()
        .map_err(|e| CaptureError::StorageError(format!("failed to stat spool: {}", e)))?
        .len();
    if data_len > MAX_DATA_SIZE {
        return Err(CaptureError::EncodingFailed(format!(
            "{} bytes of PCM exceed the WAV size limit",
            data_len
        )));
    }

    let header = encode_header(data_len as u32, format);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                CaptureError::StorageError(format!("failed to create directory: {}", e))
            })?;
        }
    }

    let part_path = partial_path(output_path);
    let result = File::create(&part_path)
        .map_err(|e| CaptureError::StorageError(format!("failed to create container: {}", e)))
        .and_then(|file| {
            materialize(BufReader::new(spool), &header, BufWriter::new(file))
                .map_err(|e| CaptureError::EncodingFailed(format!("failed to write container: {}", e)))
        })
        .and_then(|copied| {
            if copied != data_len {
                return Err(CaptureError::EncodingFailed(format!(
                    "spool changed while encoding: expected {} bytes, copied {}",
                    data_len, copied
                )));
            }
            fs::rename(&part_path, output_path).map_err(|e| {
                CaptureError::StorageError(format!("failed to move container into place: {}", e))
            })
        });

    if let Err(e) = result {
        let _ = fs::remove_file(&part_path);
        return Err(e);
    }

    log::debug!(
        "wrote container {} ({} payload bytes)",
        output_path.display(),
        data_len
    );
    Ok(data_len)
}

fn partial_path(output_path: &Path) -> PathBuf {
    let mut name = output_path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
