//! Error types for session control and the perception providers

use thiserror::Error;

use crate::models::SessionStatus;

/// Why the capture stream could not be acquired. Fatal to `start`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AcquisitionError {
    #[error("Camera access failed. Please allow camera permissions and try again.")]
    PermissionDenied,

    #[error("Camera access failed. No camera found. Please connect a camera.")]
    DeviceNotFound,

    #[error("Camera access failed. Camera is being used by another application.")]
    DeviceBusy,

    #[error("Camera access requires a secure context (HTTPS or localhost).")]
    InsecureContext,

    #[error("Camera access not supported: {0}")]
    Unsupported(String),
}

/// A single provider call or model load went wrong.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("model failed to load: {0}")]
    LoadFailed(String),

    #[error("detection failed: {0}")]
    DetectionFailed(String),

    #[error("frame unavailable: {0}")]
    FrameUnavailable(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error("Failed to load any perception model")]
    NoModelAvailable,

    #[error("cannot {action} while {from}")]
    InvalidTransition {
        from: SessionStatus,
        action: &'static str,
    },

    #[error("sampling task failed: {0}")]
    Sampler(String),
}

pub type SessionResult<T> = std::result::Result<T, SessionError>;
