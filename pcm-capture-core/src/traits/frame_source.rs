use crate::models::audio_models::{InputSource, PcmFormat};
use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;

/// A configured capture device that delivers raw PCM on demand.
///
/// Implemented by:
/// - `CpalFrameSource` (pcm-capture-cpal, `cpal` feature)
/// - scripted sources in tests
///
/// A source is single-reader: it is moved onto the capture worker and never
/// touched from another thread while the session runs.
pub trait FrameSource: Send {
    /// Begin delivering audio. Called on session start and on every resume.
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Stop delivering audio. The device stays configured and may be started again.
    fn stop(&mut self) -> Result<(), CaptureError>;

    /// Block until PCM is available and copy up to `buffer.len()` bytes into it.
    ///
    /// `Ok(0)` means nothing was read this time and is not an error. Transient
    /// driver conditions should be reported that way. `Err` is fatal for the
    /// session.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, CaptureError>;

    /// Whether the device is currently delivering audio.
    fn is_active(&self) -> bool;
}

/// Factory that knows how to configure a [`FrameSource`] for a format.
pub trait FrameSourceProvider: Send + Sync {
    type Source: FrameSource + 'static;

    /// Smallest read buffer, in bytes, the device accepts for this format.
    fn minimum_buffer_size(&self, format: &PcmFormat, input: InputSource) -> Result<usize, CaptureError>;

    /// Configure a source. `buffer_size` is the frame buffer the capture loop
    /// will read into; the device should size its internal ring to match.
    fn open(&self, config: &CaptureConfiguration, buffer_size: usize) -> Result<Self::Source, CaptureError>;
}
