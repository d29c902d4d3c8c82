//! Sample conversion from device formats to the configured PCM encoding.
//!
//! 16-bit output is signed little-endian; 8-bit output is unsigned offset
//! binary with silence at 128.

use pcm_capture_core::PcmFormat;

/// Smallest frame buffer the backend reports, in bytes.
pub const MIN_BUFFER_BYTES: usize = 256;

/// Milliseconds of audio in one minimum buffer.
pub const MIN_BUFFER_MS: usize = 20;

/// Minimum device buffer for `format`: 20 ms of audio, at least 256 bytes,
/// rounded up to whole sample frames.
pub fn minimum_buffer_size(format: &PcmFormat) -> usize {
    let align = usize::from(format.block_align()).max(1);
    let bytes = format.byte_rate() as usize * MIN_BUFFER_MS / 1000;
    let bytes = bytes.max(MIN_BUFFER_BYTES);
    bytes.div_ceil(align) * align
}

pub fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Map a signed 16-bit sample to 8-bit offset binary.
pub fn i16_to_u8(sample: i16) -> u8 {
    ((sample >> 8) + 128) as u8
}

/// Append interleaved `samples` to `out` encoded at `bits_per_sample`.
pub fn append_i16(samples: &[i16], bits_per_sample: u16, out: &mut Vec<u8>) {
    match bits_per_sample {
        8 => out.extend(samples.iter().map(|&s| i16_to_u8(s))),
        _ => {
            out.reserve(samples.len() * 2);
            for s in samples {
                out.extend_from_slice(&s.to_le_bytes());
            }
        }
    }
}

pub fn append_f32(samples: &[f32], bits_per_sample: u16, out: &mut Vec<u8>) {
    match bits_per_sample {
        8 => out.extend(samples.iter().map(|&s| i16_to_u8(f32_to_i16(s)))),
        _ => {
            out.reserve(samples.len() * 2);
            for &s in samples {
                out.extend_from_slice(&f32_to_i16(s).to_le_bytes());
            }
        }
    }
}
