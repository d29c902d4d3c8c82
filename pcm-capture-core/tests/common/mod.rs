#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use base64::{engine::general_purpose::STANDARD, Engine};
use parking_lot::Mutex;

use pcm_capture_core::{
    CaptureConfiguration, CaptureDelegate, CaptureError, CaptureState, FrameSink, FrameSource,
    FrameSourceProvider, InputSource, PcmFormat, RecordingResult,
};

/// Pushes chunks to whichever scripted source the provider opened last.
///
/// An empty chunk makes the next `read` fail. Closing the feeder makes every
/// later `read` return `Ok(0)`.
#[derive(Clone, Default)]
pub struct Feeder {
    slot: Arc<Mutex<Option<Sender<Vec<u8>>>>>,
    read_calls: Arc<AtomicUsize>,
}

impl Feeder {
    pub fn send(&self, chunk: Vec<u8>) {
        let slot = self.slot.lock();
        let tx = slot.as_ref().expect("no source opened");
        tx.send(chunk).expect("source dropped");
    }

    pub fn send_frames(&self, count: usize, len: usize) {
        for i in 0..count {
            self.send(frame(i, len));
        }
    }

    pub fn close(&self) {
        self.slot.lock().take();
    }

    /// Number of times the worker has entered `read`, including one still blocked.
    pub fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    /// Wait until the worker is parked inside its `n`th read.
    pub fn wait_for_read(&self, n: usize) {
        wait_until("worker to block in read", || self.read_calls() >= n);
    }
}

/// Frame `i` is `len` bytes of the value `i + 1`.
pub fn frame(i: usize, len: usize) -> Vec<u8> {
    vec![(i + 1) as u8; len]
}

pub struct ScriptedProvider {
    pub min_buffer: usize,
    pub fail_start: bool,
    feeder: Feeder,
}

impl ScriptedProvider {
    pub fn new(min_buffer: usize) -> (Self, Feeder) {
        let feeder = Feeder::default();
        let provider = Self {
            min_buffer,
            fail_start: false,
            feeder: feeder.clone(),
        };
        (provider, feeder)
    }

    pub fn failing_start(min_buffer: usize) -> (Self, Feeder) {
        let (mut provider, feeder) = Self::new(min_buffer);
        provider.fail_start = true;
        (provider, feeder)
    }
}

impl FrameSourceProvider for ScriptedProvider {
    type Source = ScriptedSource;

    fn minimum_buffer_size(&self, _format: &PcmFormat, _input: InputSource) -> Result<usize, CaptureError> {
        Ok(self.min_buffer)
    }

    fn open(&self, _config: &CaptureConfiguration, _buffer_size: usize) -> Result<ScriptedSource, CaptureError> {
        let (tx, rx) = mpsc::channel();
        *self.feeder.slot.lock() = Some(tx);
        Ok(ScriptedSource {
            rx,
            read_calls: Arc::clone(&self.feeder.read_calls),
            active: false,
            fail_start: self.fail_start,
        })
    }
}

pub struct ScriptedSource {
    rx: Receiver<Vec<u8>>,
    read_calls: Arc<AtomicUsize>,
    active: bool,
    fail_start: bool,
}

impl FrameSource for ScriptedSource {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.fail_start {
            return Err(CaptureError::DeviceFailed("device busy".into()));
        }
        self.active = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.active = false;
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, CaptureError> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        match self.rx.recv() {
            Ok(chunk) if chunk.is_empty() => Err(CaptureError::DeviceFailed("read failed".into())),
            Ok(chunk) => {
                let n = chunk.len().min(buffer.len());
                buffer[..n].copy_from_slice(&chunk[..n]);
                Ok(n)
            }
            Err(_) => Ok(0),
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Sink that decodes and keeps every frame.
#[derive(Default)]
pub struct CollectingSink {
    frames: Mutex<Vec<Vec<u8>>>,
}

impl CollectingSink {
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.frames.lock().len()
    }
}

impl FrameSink for CollectingSink {
    fn on_frame(&self, encoded: String) {
        let bytes = STANDARD.decode(encoded).expect("frame is valid base64");
        self.frames.lock().push(bytes);
    }
}

/// Delegate that records state names and finished results.
#[derive(Default)]
pub struct RecordingDelegate {
    pub states: Mutex<Vec<&'static str>>,
    pub finished: Mutex<Vec<RecordingResult>>,
    pub errors: Mutex<Vec<CaptureError>>,
}

impl CaptureDelegate for RecordingDelegate {
    fn on_state_changed(&self, state: &CaptureState) {
        self.states.lock().push(state.name());
    }

    fn on_error(&self, error: &CaptureError) {
        self.errors.lock().push(error.clone());
    }

    fn on_capture_finished(&self, result: &RecordingResult) {
        self.finished.lock().push(result.clone());
    }
}

pub fn config_in(dir: &Path, sample_rate: u32, channels: u16, bits_per_sample: u16) -> CaptureConfiguration {
    CaptureConfiguration {
        sample_rate,
        channels,
        bits_per_sample,
        spool_path: dir.join("temp.pcm"),
        output_path: dir.join("audio.wav"),
        ..Default::default()
    }
}

/// Poll `condition` until it holds, panicking after five seconds.
pub fn wait_until(what: &str, mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        if Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        thread::sleep(Duration::from_millis(2));
    }
}

pub fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

pub fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}
