use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;

/// Event delegate for capture session notifications.
///
/// Methods are called from the capture worker or from the caller's thread,
/// never while the session lock is held. Implementations should marshal to a
/// UI thread if needed. Every method has a no-op default.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, _state: &CaptureState) {}

    /// Called when a fault ends the session.
    fn on_error(&self, _error: &CaptureError) {}

    /// Called once the container is written and the spool removed.
    fn on_capture_finished(&self, _result: &RecordingResult) {}
}
