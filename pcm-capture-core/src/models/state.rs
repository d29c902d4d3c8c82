use super::error::CaptureError;
use super::recording_result::RecordingResult;

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// idle → recording ⇄ paused
///            ↓          ↓
///          stopping ←───┘
///            ↓
///        finalizing → completed / failed
/// ```
///
/// A fault on the worker can jump from any live state straight to `Failed`.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    Recording,
    Paused,
    Stopping,
    Finalizing,
    Completed(RecordingResult),
    Failed(CaptureError),
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, Self::Recording)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    pub fn is_stopping(&self) -> bool {
        matches!(self, Self::Stopping)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }

    /// Short lowercase name, used for logging and bridge events.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopping => "stopping",
            Self::Finalizing => "finalizing",
            Self::Completed(_) => "completed",
            Self::Failed(_) => "failed",
        }
    }
}
