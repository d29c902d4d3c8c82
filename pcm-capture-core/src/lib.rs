//! # pcm-capture-core
//!
//! Platform-agnostic PCM capture core library.
//!
//! Reads raw PCM from a live device on a dedicated worker thread, streams each
//! frame to a sink as base64, spools the raw stream to disk, and wraps it in a
//! WAV container when the session stops. Device backends implement the
//! `FrameSourceProvider` trait and plug into the generic `SessionController`.
//!
//! ## Architecture
//!
//! ```text
//! pcm-capture-core (this crate)
//! ├── traits/       ← FrameSource, FrameSourceProvider, FrameSink, CaptureDelegate
//! ├── models/       ← CaptureError, CaptureState, CaptureConfiguration, PcmFormat, etc.
//! ├── processing/   ← WAV header encoding and container materialization
//! ├── session/      ← CaptureLoop (worker) and SessionController (façade)
//! └── storage/      ← SpoolWriter, checksum, metadata sidecar
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{CaptureDiagnostics, InputSource, PcmFormat};
pub use models::config::{CaptureConfiguration, InitOptions};
pub use models::error::CaptureError;
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::CaptureState;
pub use session::capture_loop::CaptureOutcome;
pub use session::controller::{SessionController, StopCompletion};
pub use storage::spool::SpoolWriter;
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::frame_sink::{FrameSink, NullSink};
pub use traits::frame_source::{FrameSource, FrameSourceProvider};
