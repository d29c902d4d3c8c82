/// Receiver for live frames.
///
/// Called on the capture worker for every frame that survives warm-up, in read
/// order. Fire and forget: a slow sink delays the loop but never drops frames
/// from the spool.
pub trait FrameSink: Send + Sync {
    /// `encoded` is the frame's PCM bytes in standard base64.
    fn on_frame(&self, encoded: String);
}

impl<F> FrameSink for F
where
    F: Fn(String) + Send + Sync,
{
    fn on_frame(&self, encoded: String) {
        self(encoded)
    }
}

/// Sink that discards every frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn on_frame(&self, _encoded: String) {}
}
