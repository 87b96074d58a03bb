use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::Sample;
use crate::providers::{probe_faces, probe_objects, FrameSource, LoadedProviders};
use crate::session::SessionState;
use crate::settings::SamplingSettings;

// Flip to false to silence per-tick logging from this module
const TICK_LOGS: bool = true;

use crate::tick_log;

/// Everything one session's sampling loop needs besides the stream itself.
#[derive(Clone)]
pub struct SamplingJob {
    pub session_id: String,
    pub state: Arc<Mutex<SessionState>>,
    pub providers: LoadedProviders,
    pub settings: SamplingSettings,
}

/// Samples the stream at a fixed cadence until cancelled, then hands the
/// stream back.
///
/// A tick that has started always runs to completion; cancellation is only
/// observed between ticks.
pub async fn sampling_loop(
    mut source: Box<dyn FrameSource>,
    job: SamplingJob,
    cancel_token: CancellationToken,
) -> Box<dyn FrameSource> {
    let mut ticker = tokio::time::interval(job.settings.sample_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                tick_log!(debug, "sampling loop for session {} shutting down", job.session_id);
                break;
            }
            _ = ticker.tick() => {
                sample_once(source.as_mut(), &job).await;
            }
        }
    }

    source
}

async fn sample_once(source: &mut dyn FrameSource, job: &SamplingJob) {
    let frame = match source.next_frame().await {
        Ok(frame) => frame,
        Err(err) => {
            tick_log!(warn, "skipping tick for session {}: {err}", job.session_id);
            return;
        }
    };

    let timeout = job.settings.provider_timeout();
    let (faces, objects) = tokio::join!(
        probe_faces(job.providers.faces.as_ref(), &frame, timeout),
        probe_objects(job.providers.objects.as_ref(), &frame, timeout),
    );
    if let Some(reason) = faces.failure() {
        tick_log!(warn, "face probe failed on frame {}: {reason}", frame.sequence);
    }
    if let Some(reason) = objects.failure() {
        tick_log!(warn, "object probe failed on frame {}: {reason}", frame.sequence);
    }

    let sample = Sample::new(faces.into_items(), objects.into_items());
    let mut state = job.state.lock().await;
    if let Some(report) = state.apply_tick(&job.session_id, &sample, frame.size, Instant::now()) {
        for detection in &report.detections {
            tick_log!(info, "{}: {}", detection.kind, detection.detail);
        }
    }
}
