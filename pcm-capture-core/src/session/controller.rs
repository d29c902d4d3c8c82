use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use crate::models::audio_models::CaptureDiagnostics;
use crate::models::config::{CaptureConfiguration, InitOptions};
use crate::models::error::CaptureError;
use crate::models::state::CaptureState;
use crate::session::capture_loop::{CaptureLoop, CaptureOutcome, SessionShared};
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::frame_sink::{FrameSink, NullSink};
use crate::traits::frame_source::FrameSourceProvider;

/// Handle for the outcome of a `stop()` request.
///
/// Resolved exactly once by the capture worker after the container has been
/// written (or the session failed).
#[must_use = "the stop outcome is only observable through the completion"]
pub struct StopCompletion {
    rx: Receiver<CaptureOutcome>,
    delivered: Cell<bool>,
}

impl StopCompletion {
    fn new(rx: Receiver<CaptureOutcome>) -> Self {
        Self {
            rx,
            delivered: Cell::new(false),
        }
    }

    fn resolved(outcome: CaptureOutcome) -> Self {
        let (tx, rx) = mpsc::channel();
        let _ = tx.send(outcome);
        Self::new(rx)
    }

    /// Block until the session finishes.
    ///
    /// If `try_wait` already handed out the outcome this returns `Unknown`.
    pub fn wait(self) -> CaptureOutcome {
        if self.delivered.get() {
            return Err(CaptureError::Unknown("stop outcome already taken".into()));
        }
        self.rx.recv().unwrap_or_else(|_| Err(worker_vanished()))
    }

    /// Poll without blocking. Returns `Some` at most once with the outcome.
    pub fn try_wait(&self) -> Option<CaptureOutcome> {
        if self.delivered.get() {
            return None;
        }
        let outcome = match self.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(worker_vanished()),
        };
        self.delivered.set(true);
        Some(outcome)
    }
}

fn worker_vanished() -> CaptureError {
    CaptureError::Unknown("capture worker exited without an outcome".into())
}

/// Externally facing session façade.
///
/// Owns the single capture session: one configured source, at most one worker
/// thread, at most one pending stop. Generic over the device backend via
/// [`FrameSourceProvider`].
///
/// ```text
/// init → start → (pause ⇄ resume)* → stop → StopCompletion::wait
/// ```
pub struct SessionController<P: FrameSourceProvider> {
    provider: P,
    sink: Arc<dyn FrameSink>,
    delegate: Option<Arc<dyn CaptureDelegate>>,
    config: Option<CaptureConfiguration>,
    buffer_size: usize,
    source: Option<P::Source>,
    shared: Arc<SessionShared>,
    worker: Option<thread::JoinHandle<()>>,
}

impl<P: FrameSourceProvider> SessionController<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            sink: Arc::new(NullSink),
            delegate: None,
            config: None,
            buffer_size: 0,
            source: None,
            shared: Arc::new(SessionShared::new()),
            worker: None,
        }
    }

    /// Use `sink` for live frames from the next session on.
    pub fn with_sink(mut self, sink: Arc<dyn FrameSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> CaptureState {
        self.shared.control.lock().state.clone()
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.shared.control.lock().diagnostics.clone()
    }

    /// Whether a capture worker is running.
    pub fn is_active(&self) -> bool {
        self.shared.control.lock().worker_active
    }

    /// Frame buffer size chosen by the last successful `init`.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    pub fn config(&self) -> Option<&CaptureConfiguration> {
        self.config.as_ref()
    }

    /// Validate and apply configuration, then configure the device.
    ///
    /// Rejected with `SessionActive` while a worker runs. Resets the session to
    /// idle and discards any unclaimed outcome.
    pub fn init(&mut self, config: CaptureConfiguration) -> Result<(), CaptureError> {
        if self.is_active() {
            return Err(CaptureError::SessionActive);
        }

        config.validate().map_err(CaptureError::ConfigurationFailed)?;

        let minimum = self
            .provider
            .minimum_buffer_size(&config.format(), config.input_source)?;
        if minimum == 0 {
            return Err(CaptureError::ConfigurationFailed(
                "device reported a zero minimum buffer size".into(),
            ));
        }
        let buffer_size = minimum.checked_mul(config.buffer_multiplier).ok_or_else(|| {
            CaptureError::ConfigurationFailed(format!(
                "buffer size overflow: {} x {}",
                minimum, config.buffer_multiplier
            ))
        })?;

        self.reap_worker();
        // Release the previous device before configuring a new one.
        self.source = None;
        let source = self.provider.open(&config, buffer_size)?;

        {
            let mut control = self.shared.control.lock();
            control.state = CaptureState::Idle;
            control.pending = None;
            control.parked = None;
            control.diagnostics = CaptureDiagnostics::default();
        }

        log::info!(
            "configured capture: {} Hz, {} ch, {} bit, source {:?}, buffer {} bytes",
            config.sample_rate,
            config.channels,
            config.bits_per_sample,
            config.input_source,
            buffer_size
        );

        self.source = Some(source);
        self.buffer_size = buffer_size;
        self.config = Some(config);
        self.notify_state(&CaptureState::Idle);
        Ok(())
    }

    /// `init` from bridge options, resolving file names against `files_dir`.
    pub fn init_with_options(&mut self, options: &InitOptions, files_dir: &Path) -> Result<(), CaptureError> {
        let config = options
            .resolve(files_dir)
            .map_err(CaptureError::ConfigurationFailed)?;
        self.init(config)
    }

    /// Spawn the capture worker. A no-op while a worker is already running.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        let config = self.config.clone().ok_or(CaptureError::NotConfigured)?;

        if self.is_active() {
            log::debug!("start ignored: capture already running");
            return Ok(());
        }

        let source = match self.source.take() {
            Some(source) => source,
            None => self.provider.open(&config, self.buffer_size)?,
        };
        self.reap_worker();

        {
            let mut control = self.shared.control.lock();
            if control.parked.take().is_some() {
                log::warn!("discarding unclaimed outcome of the previous session");
            }
            control.pending = None;
            control.state = CaptureState::Recording;
            control.worker_active = true;
            control.diagnostics = CaptureDiagnostics::default();
        }

        let capture = CaptureLoop::new(
            config,
            source,
            Arc::clone(&self.sink),
            self.delegate.clone(),
            Arc::clone(&self.shared),
            self.buffer_size,
        );
        let shared = Arc::clone(&self.shared);
        let delegate = self.delegate.clone();

        let spawned = thread::Builder::new()
            .name("pcm-capture".into())
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| capture.run()))
                    .unwrap_or_else(|_| Err(CaptureError::Unknown("capture worker panicked".into())));
                CaptureLoop::<P::Source>::publish(&shared, delegate.as_ref(), outcome);
            });

        match spawned {
            Ok(handle) => {
                self.worker = Some(handle);
                log::info!("capture started");
                self.notify_state(&CaptureState::Recording);
                Ok(())
            }
            Err(e) => {
                let mut control = self.shared.control.lock();
                control.state = CaptureState::Idle;
                control.worker_active = false;
                Err(CaptureError::Unknown(format!(
                    "failed to spawn capture thread: {}",
                    e
                )))
            }
        }
    }

    /// Ask the worker to pause. Always succeeds; ignored unless recording.
    pub fn pause(&self) {
        let changed = {
            let mut control = self.shared.control.lock();
            if control.worker_active && control.state.is_recording() {
                control.state = CaptureState::Paused;
                true
            } else {
                false
            }
        };
        if changed {
            self.shared.wake.notify_all();
            log::info!("capture paused");
            self.notify_state(&CaptureState::Paused);
        }
    }

    /// Ask the worker to resume. Always succeeds; ignored unless paused.
    pub fn resume(&self) {
        let changed = {
            let mut control = self.shared.control.lock();
            if control.worker_active && control.state.is_paused() {
                control.state = CaptureState::Recording;
                true
            } else {
                false
            }
        };
        if changed {
            self.shared.wake.notify_all();
            log::info!("capture resumed");
            self.notify_state(&CaptureState::Recording);
        }
    }

    /// Request the session to stop and finalize.
    ///
    /// The returned completion is resolved by the worker. It resolves
    /// immediately only when there is nothing to wait for: an outcome already
    /// produced by a failed session, no running session (`NotRecording`), or a
    /// stop that is already pending (`StopInProgress`).
    pub fn stop(&self) -> StopCompletion {
        let (tx, rx) = mpsc::channel();
        {
            let mut control = self.shared.control.lock();
            if let Some(outcome) = control.parked.take() {
                return StopCompletion::resolved(outcome);
            }
            if !control.worker_active {
                return StopCompletion::resolved(Err(CaptureError::NotRecording));
            }
            if control.pending.is_some() {
                return StopCompletion::resolved(Err(CaptureError::StopInProgress));
            }
            control.pending = Some(tx);
            control.state = CaptureState::Stopping;
        }
        self.shared.wake.notify_all();
        log::info!("capture stop requested");
        self.notify_state(&CaptureState::Stopping);
        StopCompletion::new(rx)
    }

    fn reap_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                log::warn!("capture worker terminated abnormally");
            }
        }
    }

    fn notify_state(&self, state: &CaptureState) {
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(state);
        }
    }
}

impl<P: FrameSourceProvider> Drop for SessionController<P> {
    fn drop(&mut self) {
        let stopping = {
            let mut control = self.shared.control.lock();
            if control.worker_active && (control.state.is_recording() || control.state.is_paused()) {
                control.state = CaptureState::Stopping;
                true
            } else {
                false
            }
        };
        if stopping {
            self.shared.wake.notify_all();
            log::warn!("session controller dropped while capturing; finalizing in background");
        }
    }
}
