use thiserror::Error;

/// Errors that can occur during audio capture operations.
///
/// `ConfigurationFailed` is only ever returned synchronously from `init`.
/// Every other fault raised on the capture worker ends up as the single
/// failed outcome of the session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("device error: {0}")]
    DeviceFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("session not configured")]
    NotConfigured,

    #[error("a capture session is already active")]
    SessionActive,

    #[error("no capture session is recording")]
    NotRecording,

    #[error("stop already requested for this session")]
    StopInProgress,

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl CaptureError {
    /// Stable code for reporting the error across a bridge boundary.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigurationFailed(_) => "E_CONFIG",
            Self::DeviceFailed(_) => "E_DEVICE",
            Self::StorageError(_) => "E_IO",
            Self::EncodingFailed(_) => "E_ENCODING",
            Self::NotConfigured | Self::SessionActive | Self::NotRecording | Self::StopInProgress => {
                "E_STATE"
            }
            Self::Unknown(_) => "E_UNKNOWN",
        }
    }
}
