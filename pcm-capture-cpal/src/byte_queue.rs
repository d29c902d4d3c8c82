//! Bounded byte queue between a device callback and a blocking reader.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use pcm_capture_core::CaptureError;

struct QueueInner {
    bytes: VecDeque<u8>,
    open: bool,
    fault: Option<String>,
    dropped: u64,
}

/// Producer side is the device callback, consumer side is `FrameSource::read`.
///
/// When the queue is full the oldest bytes are discarded so the callback never
/// blocks.
pub struct ByteQueue {
    inner: Mutex<QueueInner>,
    ready: Condvar,
    capacity: usize,
}

impl ByteQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                bytes: VecDeque::with_capacity(capacity),
                open: false,
                fault: None,
                dropped: 0,
            }),
            ready: Condvar::new(),
            capacity: capacity.max(1),
        }
    }

    /// Clear any leftover bytes and accept new input.
    pub fn open(&self) {
        let mut inner = self.inner.lock();
        inner.bytes.clear();
        inner.open = true;
        inner.fault = None;
    }

    /// Stop accepting input and wake the reader.
    pub fn close(&self) {
        self.inner.lock().open = false;
        self.ready.notify_all();
    }

    /// Record a device fault. The next `read` returns it.
    pub fn fail(&self, message: impl Into<String>) {
        let mut inner = self.inner.lock();
        inner.fault = Some(message.into());
        inner.open = false;
        drop(inner);
        self.ready.notify_all();
    }

    pub fn push(&self, data: &[u8]) {
        let mut inner = self.inner.lock();
        if !inner.open {
            return;
        }
        inner.bytes.extend(data);
        let excess = inner.bytes.len().saturating_sub(self.capacity);
        if excess > 0 {
            inner.bytes.drain(..excess);
            inner.dropped += excess as u64;
            log::warn!("input queue overflow, dropped {} bytes", excess);
        }
        let filled = inner.bytes.len();
        drop(inner);
        if filled > 0 {
            self.ready.notify_all();
        }
    }

    /// Block until `buf` can be filled completely or the queue closes.
    ///
    /// After close the remaining bytes are drained, then `Ok(0)` is returned.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, CaptureError> {
        let mut inner = self.inner.lock();
        while inner.open && inner.fault.is_none() && inner.bytes.len() < buf.len() {
            self.ready.wait(&mut inner);
        }
        if let Some(fault) = inner.fault.take() {
            return Err(CaptureError::DeviceFailed(fault));
        }
        let n = inner.bytes.len().min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(inner.bytes.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes discarded on overflow since creation.
    pub fn dropped(&self) -> u64 {
        self.inner.lock().dropped
    }
}
