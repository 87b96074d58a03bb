use log::{error, info};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{SessionError, SessionResult};
use crate::providers::FrameSource;

use super::loop_worker::{sampling_loop, SamplingJob};

/// Owns the capture stream of the current session and the task sampling it.
///
/// While the loop runs, the stream lives inside the task and comes back when
/// the task is joined, so pausing keeps the device open and stopping drops it.
pub struct SamplingController {
    source: Option<Box<dyn FrameSource>>,
    job: Option<SamplingJob>,
    handle: Option<JoinHandle<Box<dyn FrameSource>>>,
    cancel_token: Option<CancellationToken>,
}

impl SamplingController {
    pub fn new() -> Self {
        Self {
            source: None,
            job: None,
            handle: None,
            cancel_token: None,
        }
    }

    /// Hands over a freshly acquired stream for the session described by `job`.
    pub fn attach(&mut self, source: Box<dyn FrameSource>, job: SamplingJob) {
        self.source = Some(source);
        self.job = Some(job);
    }

    pub fn start_sampling(&mut self) -> SessionResult<()> {
        if self.handle.is_some() {
            return Err(SessionError::Sampler("sampling already active".into()));
        }
        let (Some(source), Some(job)) = (self.source.take(), self.job.clone()) else {
            return Err(SessionError::Sampler("no capture stream attached".into()));
        };

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(sampling_loop(source, job, cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Cancels the loop and waits for its in-flight tick to land.
    ///
    /// A loop that died on its own has already ended; the stream it owned is
    /// gone with it and the session can still be paused or stopped.
    pub async fn stop_sampling(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            match handle.await {
                Ok(source) => self.source = Some(source),
                Err(err) => error!("sampling loop ended abnormally: {err}"),
            }
        }
    }

    /// Drops the capture stream, releasing the device.
    pub fn release(&mut self) {
        if self.source.take().is_some() {
            info!("capture stream released");
        }
        self.job = None;
    }
}

impl Default for SamplingController {
    fn default() -> Self {
        Self::new()
    }
}
