//! cpal input capture provider.
//!
//! Opens the default input device at the configured rate and channel count and
//! feeds converted PCM into a `ByteQueue`. The `cpal::Stream` lives on a
//! dedicated input thread for its whole life.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};

use pcm_capture_core::{
    CaptureConfiguration, CaptureError, FrameSource, FrameSourceProvider, InputSource, PcmFormat,
};

use crate::byte_queue::ByteQueue;
use crate::convert;

/// Frame buffers of slack the queue holds before dropping input.
const QUEUE_BUFFERS: usize = 8;

/// Provider for the host's default input device.
#[derive(Debug, Default, Clone)]
pub struct CpalProvider;

impl CpalProvider {
    fn input_device() -> Result<cpal::Device, CaptureError> {
        cpal::default_host()
            .default_input_device()
            .ok_or_else(|| CaptureError::DeviceFailed("no default input device".into()))
    }
}

impl FrameSourceProvider for CpalProvider {
    type Source = CpalFrameSource;

    fn minimum_buffer_size(&self, format: &PcmFormat, input: InputSource) -> Result<usize, CaptureError> {
        let device = Self::input_device()?;
        if input != InputSource::Default {
            log::debug!("input source {:?} not selectable with cpal, using default device", input);
        }
        log::debug!(
            "input device: {}",
            device.name().unwrap_or_else(|_| "unknown".into())
        );
        Ok(convert::minimum_buffer_size(format))
    }

    fn open(&self, config: &CaptureConfiguration, buffer_size: usize) -> Result<CpalFrameSource, CaptureError> {
        let queue_capacity = buffer_size.checked_mul(QUEUE_BUFFERS).ok_or_else(|| {
            CaptureError::ConfigurationFailed(format!("queue size overflow: {}", buffer_size))
        })?;
        Ok(CpalFrameSource {
            format: config.format(),
            queue: Arc::new(ByteQueue::new(queue_capacity)),
            input: None,
        })
    }
}

struct InputThread {
    shutdown: Sender<()>,
    handle: thread::JoinHandle<()>,
}

/// One configured input stream; started and stopped by the capture worker.
pub struct CpalFrameSource {
    format: PcmFormat,
    queue: Arc<ByteQueue>,
    input: Option<InputThread>,
}

impl FrameSource for CpalFrameSource {
    fn start(&mut self) -> Result<(), CaptureError> {
        if self.input.is_some() {
            return Ok(());
        }

        self.queue.open();
        let (ready_tx, ready_rx) = mpsc::sync_channel(1);
        let (shutdown, shutdown_rx) = mpsc::channel();
        let queue = Arc::clone(&self.queue);
        let format = self.format;

        let handle = thread::Builder::new()
            .name("cpal-input".into())
            .spawn(move || {
                let stream = match build_stream(format, Arc::clone(&queue)) {
                    Ok(stream) => stream,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                hold_until_shutdown(stream, &shutdown_rx);
                queue.close();
            })
            .map_err(|e| CaptureError::Unknown(format!("failed to spawn input thread: {}", e)))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.input = Some(InputThread { shutdown, handle });
                log::info!(
                    "cpal input started: {} Hz, {} ch, {} bit",
                    format.sample_rate,
                    format.channels,
                    format.bits_per_sample
                );
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                self.queue.close();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                self.queue.close();
                Err(CaptureError::DeviceFailed("input thread exited during start".into()))
            }
        }
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        if let Some(input) = self.input.take() {
            let _ = input.shutdown.send(());
            if input.handle.join().is_err() {
                log::warn!("cpal input thread panicked");
            }
        }
        self.queue.close();
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, CaptureError> {
        self.queue.read(buffer)
    }

    fn is_active(&self) -> bool {
        self.input.is_some()
    }
}

impl Drop for CpalFrameSource {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn hold_until_shutdown(stream: cpal::Stream, shutdown: &Receiver<()>) {
    // Returns on an explicit shutdown or when the source is dropped.
    let _ = shutdown.recv();
    if let Err(e) = stream.pause() {
        log::debug!("failed to pause input stream: {}", e);
    }
    drop(stream);
}

fn build_stream(format: PcmFormat, queue: Arc<ByteQueue>) -> Result<cpal::Stream, CaptureError> {
    let device = CpalProvider::input_device()?;
    let sample_format = device
        .default_input_config()
        .map_err(|e| CaptureError::DeviceFailed(format!("failed to query input config: {}", e)))?
        .sample_format();

    let config = StreamConfig {
        channels: format.channels,
        sample_rate: SampleRate(format.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };
    let bits = format.bits_per_sample;

    let error_queue = Arc::clone(&queue);
    let on_error = move |err: cpal::StreamError| {
        log::error!("input stream error: {}", err);
        error_queue.fail(err.to_string());
    };

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                let mut bytes = Vec::with_capacity(data.len() * 2);
                convert::append_i16(data, bits, &mut bytes);
                queue.push(&bytes);
            },
            on_error,
            None,
        ),
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let mut bytes = Vec::with_capacity(data.len() * 2);
                convert::append_f32(data, bits, &mut bytes);
                queue.push(&bytes);
            },
            on_error,
            None,
        ),
        other => {
            return Err(CaptureError::DeviceFailed(format!(
                "unsupported device sample format: {:?}",
                other
            )))
        }
    }
    .map_err(|e| CaptureError::DeviceFailed(format!("failed to open input stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| CaptureError::DeviceFailed(format!("failed to start input stream: {}", e)))?;

    Ok(stream)
}
