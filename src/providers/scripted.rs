//! In-memory providers that replay canned responses.
//!
//! Each perception provider serves its queued responses first, then repeats
//! its constant response forever.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AcquisitionError, ProviderError};
use crate::models::{FaceBox, FrameSize, ScoredObject};
use crate::providers::{
    CaptureProvider, FaceProvider, Frame, FrameSource, MediaChunk, ObjectProvider, Recorder,
};

struct Script<T> {
    queue: Mutex<VecDeque<Result<Vec<T>, ProviderError>>>,
    constant: Vec<T>,
    load_error: Option<ProviderError>,
    latency: Option<Duration>,
    panic_message: Option<&'static str>,
    calls: AtomicUsize,
}

impl<T: Clone> Script<T> {
    fn new(constant: Vec<T>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            constant,
            load_error: None,
            latency: None,
            panic_message: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn push(&self, response: Result<Vec<T>, ProviderError>, times: usize) {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        queue.extend(std::iter::repeat(response).take(times));
    }

    async fn next(&self) -> Result<Vec<T>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.panic_message {
            panic!("{message}");
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        let queued = self
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        queued.unwrap_or_else(|| Ok(self.constant.clone()))
    }

    fn load(&self) -> Result<(), ProviderError> {
        match &self.load_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

macro_rules! scripted_provider {
    ($name:ident, $item:ty) => {
        pub struct $name {
            script: Script<$item>,
        }

        impl $name {
            pub fn constant(items: Vec<$item>) -> Self {
                Self {
                    script: Script::new(items),
                }
            }

            pub fn empty() -> Self {
                Self::constant(Vec::new())
            }

            /// A provider whose model never loads.
            pub fn unloadable(reason: &str) -> Self {
                let mut provider = Self::empty();
                provider.script.load_error = Some(ProviderError::LoadFailed(reason.to_string()));
                provider
            }

            pub fn respond_times(self, items: Vec<$item>, times: usize) -> Self {
                self.script.push(Ok(items), times);
                self
            }

            pub fn fail_once(self, err: ProviderError) -> Self {
                self.script.push(Err(err), 1);
                self
            }

            /// Every detection call panics with `message`.
            pub fn panicking(mut self, message: &'static str) -> Self {
                self.script.panic_message = Some(message);
                self
            }

            pub fn with_latency(mut self, latency: Duration) -> Self {
                self.script.latency = Some(latency);
                self
            }

            pub fn calls(&self) -> usize {
                self.script.calls.load(Ordering::SeqCst)
            }
        }
    };
}

scripted_provider!(ScriptedFaces, FaceBox);
scripted_provider!(ScriptedObjects, ScoredObject);

#[async_trait]
impl FaceProvider for ScriptedFaces {
    async fn load(&self) -> Result<(), ProviderError> {
        self.script.load()
    }

    async fn estimate_faces(&self, _frame: &Frame) -> Result<Vec<FaceBox>, ProviderError> {
        self.script.next().await
    }
}

#[async_trait]
impl ObjectProvider for ScriptedObjects {
    async fn load(&self) -> Result<(), ProviderError> {
        self.script.load()
    }

    async fn detect(&self, _frame: &Frame) -> Result<Vec<ScoredObject>, ProviderError> {
        self.script.next().await
    }
}

/// Capture provider handing out blank frames of a fixed size.
pub struct ScriptedCapture {
    size: FrameSize,
    failure: Option<AcquisitionError>,
    acquired: AtomicUsize,
    released: Arc<AtomicUsize>,
}

impl ScriptedCapture {
    pub fn new(size: FrameSize) -> Self {
        Self {
            size,
            failure: None,
            acquired: AtomicUsize::new(0),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn failing(failure: AcquisitionError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new(FrameSize::new(640.0, 480.0))
        }
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Streams dropped so far.
    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CaptureProvider for ScriptedCapture {
    async fn acquire(&self) -> Result<Box<dyn FrameSource>, AcquisitionError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StillFrames {
            size: self.size,
            sequence: 0,
            released: Arc::clone(&self.released),
        }))
    }
}

struct StillFrames {
    size: FrameSize,
    sequence: u64,
    released: Arc<AtomicUsize>,
}

#[async_trait]
impl FrameSource for StillFrames {
    async fn next_frame(&mut self) -> Result<Frame, ProviderError> {
        self.sequence += 1;
        Ok(Frame::blank(self.sequence, self.size))
    }
}

impl Drop for StillFrames {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Recorder that keeps a log of lifecycle calls and emits one chunk per
/// recorded stretch.
#[derive(Default)]
pub struct MemoryRecorder {
    calls: Mutex<Vec<&'static str>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: &'static str) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl Recorder for MemoryRecorder {
    fn start(&self) {
        self.record("start");
    }

    fn pause(&self) {
        self.record("pause");
    }

    fn resume(&self) {
        self.record("resume");
    }

    fn stop(&self) -> Vec<MediaChunk> {
        self.record("stop");
        self.calls()
            .iter()
            .filter(|c| matches!(**c, "start" | "resume"))
            .enumerate()
            .map(|(i, _)| format!("segment-{i}").into_bytes())
            .collect()
    }
}
