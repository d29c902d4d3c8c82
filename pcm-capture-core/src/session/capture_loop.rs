use std::fs;
use std::path::Path;
use std::sync::mpsc::Sender;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use parking_lot::{Condvar, Mutex};

use crate::models::audio_models::CaptureDiagnostics;
use crate::models::config::CaptureConfiguration;
use crate::models::error::CaptureError;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::models::state::CaptureState;
use crate::processing::wav_format;
use crate::storage::metadata;
use crate::storage::spool::{self, SpoolWriter};
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::frame_sink::FrameSink;
use crate::traits::frame_source::FrameSource;

/// Terminal result of one capture session.
pub type CaptureOutcome = Result<RecordingResult, CaptureError>;

/// State touched by both the caller and the capture worker.
///
/// Every field is read and written under `SessionShared::control`; the worker
/// parks on `SessionShared::wake` while paused.
pub(crate) struct Control {
    pub state: CaptureState,
    pub pending: Option<Sender<CaptureOutcome>>,
    /// Outcome produced with no stop pending; handed to the next `stop()`.
    pub parked: Option<CaptureOutcome>,
    pub worker_active: bool,
    pub diagnostics: CaptureDiagnostics,
}

pub(crate) struct SessionShared {
    pub control: Mutex<Control>,
    pub wake: Condvar,
}

impl SessionShared {
    pub fn new() -> Self {
        Self {
            control: Mutex::new(Control {
                state: CaptureState::Idle,
                pending: None,
                parked: None,
                worker_active: false,
                diagnostics: CaptureDiagnostics::default(),
            }),
            wake: Condvar::new(),
        }
    }
}

enum Step {
    Read,
    Pause,
    Stop,
}

/// The capture worker: drives one session from device start to container.
pub(crate) struct CaptureLoop<S: FrameSource> {
    config: CaptureConfiguration,
    source: S,
    sink: Arc<dyn FrameSink>,
    delegate: Option<Arc<dyn CaptureDelegate>>,
    shared: Arc<SessionShared>,
    buffer_size: usize,
}

impl<S: FrameSource> CaptureLoop<S> {
    pub fn new(
        config: CaptureConfiguration,
        source: S,
        sink: Arc<dyn FrameSink>,
        delegate: Option<Arc<dyn CaptureDelegate>>,
        shared: Arc<SessionShared>,
        buffer_size: usize,
    ) -> Self {
        Self {
            config,
            source,
            sink,
            delegate,
            shared,
            buffer_size,
        }
    }

    /// Record until stopped, then finalize. Faults anywhere become the `Err`
    /// outcome and leave the raw spool on disk.
    pub fn run(mut self) -> CaptureOutcome {
        let mut spool = SpoolWriter::new(self.config.spool_path.clone());

        let outcome = self
            .record(&mut spool)
            .and_then(|spooled| self.finalize(spool.file_path(), spooled));

        if let Err(ref e) = outcome {
            log::error!("capture session failed: {}", e);
            if self.source.is_active() {
                if let Err(stop_err) = self.source.stop() {
                    log::warn!("failed to stop device after fault: {}", stop_err);
                }
            }
            if spool.is_open() {
                if let Err(close_err) = spool.close() {
                    log::warn!("failed to close spool after fault: {}", close_err);
                }
            }
        }

        outcome
    }

    /// Hand the outcome to the pending completion, or park it for the next
    /// `stop()`. Called exactly once per session.
    pub fn publish(
        shared: &SessionShared,
        delegate: Option<&Arc<dyn CaptureDelegate>>,
        outcome: CaptureOutcome,
    ) {
        let (pending, state) = {
            let mut control = shared.control.lock();
            control.worker_active = false;
            control.state = match &outcome {
                Ok(result) => CaptureState::Completed(result.clone()),
                Err(e) => CaptureState::Failed(e.clone()),
            };
            let pending = control.pending.take();
            if pending.is_none() {
                control.parked = Some(outcome.clone());
            }
            (pending, control.state.clone())
        };
        shared.wake.notify_all();

        if let Some(delegate) = delegate {
            match &outcome {
                Ok(result) => delegate.on_capture_finished(result),
                Err(e) => delegate.on_error(e),
            }
            delegate.on_state_changed(&state);
        }

        if let Some(tx) = pending {
            if tx.send(outcome).is_err() {
                log::debug!("stop completion was dropped before the outcome arrived");
            }
        }
    }

    fn record(&mut self, spool: &mut SpoolWriter) -> Result<u64, CaptureError> {
        self.start_source()?;
        spool.open()?;

        let mut buffer = vec![0u8; self.buffer_size];
        let mut warmup = 0u32;

        loop {
            match self.next_step() {
                Step::Stop => break,
                Step::Pause => {
                    if self.source.is_active() {
                        self.stop_source()?;
                    }
                    if !self.wait_while_paused() {
                        break;
                    }
                    self.start_source()?;
                    warmup = 0;
                }
                Step::Read => {
                    let n = self.source.read(&mut buffer)?.min(buffer.len());
                    if n == 0 {
                        self.shared.control.lock().diagnostics.empty_reads += 1;
                        continue;
                    }

                    warmup = warmup.saturating_add(1);
                    let skip = warmup <= self.config.warmup_buffers;
                    let paused = {
                        let mut control = self.shared.control.lock();
                        control.diagnostics.reads += 1;
                        if skip {
                            control.diagnostics.warmup_skipped += 1;
                        }
                        control.state.is_paused()
                    };
                    // A buffer that completed after pause was requested is dropped.
                    if skip || paused {
                        continue;
                    }

                    let frame = &buffer[..n];
                    self.sink.on_frame(STANDARD.encode(frame));
                    spool.append(frame)?;

                    let mut control = self.shared.control.lock();
                    control.diagnostics.frames_emitted += 1;
                    control.diagnostics.bytes_spooled += n as u64;
                }
            }
        }

        if self.source.is_active() {
            self.stop_source()?;
        }
        let spooled = spool.close()?;
        self.set_state(CaptureState::Finalizing);
        log::info!("capture stopped, {} bytes spooled", spooled);
        Ok(spooled)
    }

    fn finalize(&mut self, spool_path: &Path, spooled: u64) -> CaptureOutcome {
        let format = self.config.format();
        let output_path = &self.config.output_path;

        let data_bytes = wav_format::write_container(spool_path, &format, output_path)?;
        if data_bytes != spooled {
            log::warn!(
                "spool length {} differs from bytes written {}",
                data_bytes,
                spooled
            );
        }

        let checksum = spool::sha256_file(output_path)?;
        let file_path = output_path.to_string_lossy();
        let metadata =
            RecordingMetadata::new(format, self.config.input_source, &file_path, data_bytes, &checksum);

        if self.config.write_metadata {
            metadata::write_metadata(&metadata, output_path)?;
        }

        if let Err(e) = fs::remove_file(spool_path) {
            log::warn!("failed to delete spool {}: {}", spool_path.display(), e);
        }

        log::info!("container written to {}", output_path.display());

        Ok(RecordingResult {
            file_path: output_path.clone(),
            data_bytes,
            duration_secs: metadata.duration_secs,
            checksum,
            metadata,
        })
    }

    fn next_step(&self) -> Step {
        let control = self.shared.control.lock();
        match control.state {
            CaptureState::Paused => Step::Pause,
            CaptureState::Recording => Step::Read,
            _ => Step::Stop,
        }
    }

    /// Park until the state leaves `Paused`. Returns `false` if it left for
    /// anything other than `Recording`.
    fn wait_while_paused(&self) -> bool {
        let mut control = self.shared.control.lock();
        while control.state.is_paused() {
            self.shared.wake.wait(&mut control);
        }
        control.state.is_recording()
    }

    fn start_source(&mut self) -> Result<(), CaptureError> {
        self.source.start()?;
        self.shared.control.lock().diagnostics.device_starts += 1;
        log::debug!("device started");
        Ok(())
    }

    fn stop_source(&mut self) -> Result<(), CaptureError> {
        self.source.stop()?;
        self.shared.control.lock().diagnostics.device_stops += 1;
        log::debug!("device stopped");
        Ok(())
    }

    fn set_state(&self, state: CaptureState) {
        self.shared.control.lock().state = state.clone();
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&state);
        }
    }
}
