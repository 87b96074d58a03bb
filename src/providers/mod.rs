//! Seams to the external collaborators: capture, perception models and the
//! media recorder.
//!
//! All perception traits are async and backend-agnostic. In-memory scripted
//! implementations live in [`scripted`] for tests and offline runs.

pub mod probe;
pub mod scripted;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{AcquisitionError, ProviderError};
use crate::models::{FaceBox, FrameSize, ScoredObject};

pub use probe::{probe_faces, probe_objects, Coverage, Probe};

/// Opaque encoded media produced by a recorder.
pub type MediaChunk = Vec<u8>;

/// One captured frame. The core only reads `size`; pixels are passed through
/// to the perception providers untouched.
#[derive(Debug, Clone)]
pub struct Frame {
    pub sequence: u64,
    pub size: FrameSize,
    pub pixels: Arc<[u8]>,
}

impl Frame {
    pub fn blank(sequence: u64, size: FrameSize) -> Self {
        Self {
            sequence,
            size,
            pixels: Arc::from(Vec::new()),
        }
    }
}

#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// Opens the camera stream. Permission, device and secure-context
    /// failures are reported as [`AcquisitionError`].
    async fn acquire(&self) -> Result<Box<dyn FrameSource>, AcquisitionError>;
}

/// A live capture stream. Dropping it releases the device.
#[async_trait]
pub trait FrameSource: Send {
    async fn next_frame(&mut self) -> Result<Frame, ProviderError>;
}

#[async_trait]
pub trait FaceProvider: Send + Sync {
    /// Loads the model. Called once per session start.
    async fn load(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn estimate_faces(&self, frame: &Frame) -> Result<Vec<FaceBox>, ProviderError>;
}

#[async_trait]
pub trait ObjectProvider: Send + Sync {
    async fn load(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    async fn detect(&self, frame: &Frame) -> Result<Vec<ScoredObject>, ProviderError>;
}

/// Records the capture stream alongside detection. Opaque to the core.
pub trait Recorder: Send + Sync {
    fn start(&self);
    fn pause(&self);
    fn resume(&self);
    fn stop(&self) -> Vec<MediaChunk>;
}

/// Everything a session needs from the outside world.
#[derive(Clone)]
pub struct Collaborators {
    pub capture: Arc<dyn CaptureProvider>,
    pub faces: Option<Arc<dyn FaceProvider>>,
    pub objects: Option<Arc<dyn ObjectProvider>>,
    pub recorder: Option<Arc<dyn Recorder>>,
}

impl Collaborators {
    pub fn new(capture: Arc<dyn CaptureProvider>) -> Self {
        Self {
            capture,
            faces: None,
            objects: None,
            recorder: None,
        }
    }

    pub fn with_faces(mut self, faces: Arc<dyn FaceProvider>) -> Self {
        self.faces = Some(faces);
        self
    }

    pub fn with_objects(mut self, objects: Arc<dyn ObjectProvider>) -> Self {
        self.objects = Some(objects);
        self
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn Recorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }
}

/// Perception providers that loaded successfully for the current session.
#[derive(Clone, Default)]
pub struct LoadedProviders {
    pub faces: Option<Arc<dyn FaceProvider>>,
    pub objects: Option<Arc<dyn ObjectProvider>>,
}

impl LoadedProviders {
    pub fn coverage(&self) -> Coverage {
        Coverage {
            faces: self.faces.is_some(),
            objects: self.objects.is_some(),
        }
    }
}
