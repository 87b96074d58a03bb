use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::error::ProviderError;
use crate::models::{FaceBox, ScoredObject};
use crate::providers::{FaceProvider, Frame, ObjectProvider};

/// Outcome of asking one provider about one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Probe<T> {
    /// No provider for the whole session; reported once via [`Coverage`].
    Unavailable,
    /// The call failed or timed out this tick.
    Failed(String),
    Detected(Vec<T>),
}

impl<T> Probe<T> {
    /// Failures and unavailability both read as "nothing seen".
    pub fn into_items(self) -> Vec<T> {
        match self {
            Probe::Detected(items) => items,
            Probe::Unavailable | Probe::Failed(_) => Vec::new(),
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            Probe::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Which perception providers a session runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coverage {
    pub faces: bool,
    pub objects: bool,
}

impl Coverage {
    pub fn full() -> Self {
        Self {
            faces: true,
            objects: true,
        }
    }

    pub fn none() -> Self {
        Self {
            faces: false,
            objects: false,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !(self.faces && self.objects)
    }

    pub fn is_empty(&self) -> bool {
        !self.faces && !self.objects
    }

    pub fn describe(&self) -> String {
        match (self.faces, self.objects) {
            (true, true) => "full coverage".to_string(),
            (true, false) => "object flagging disabled: object detection unavailable".to_string(),
            (false, true) => {
                "gaze and absence detection disabled: face detection unavailable".to_string()
            }
            (false, false) => "no perception available".to_string(),
        }
    }
}

/// Runs the face provider on its own task, so a panic inside it surfaces
/// as a failed probe instead of taking down the caller.
pub async fn probe_faces(
    provider: Option<&Arc<dyn FaceProvider>>,
    frame: &Frame,
    timeout: Duration,
) -> Probe<FaceBox> {
    let Some(provider) = provider.cloned() else {
        return Probe::Unavailable;
    };
    let frame = frame.clone();
    let call = tokio::spawn(async move { provider.estimate_faces(&frame).await });
    settle("face detection", call, timeout).await
}

pub async fn probe_objects(
    provider: Option<&Arc<dyn ObjectProvider>>,
    frame: &Frame,
    timeout: Duration,
) -> Probe<ScoredObject> {
    let Some(provider) = provider.cloned() else {
        return Probe::Unavailable;
    };
    let frame = frame.clone();
    let call = tokio::spawn(async move { provider.detect(&frame).await });
    settle("object detection", call, timeout).await
}

async fn settle<T>(
    what: &str,
    call: JoinHandle<Result<Vec<T>, ProviderError>>,
    timeout: Duration,
) -> Probe<T> {
    let abort = call.abort_handle();
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(Ok(items))) => Probe::Detected(items),
        Ok(Ok(Err(err))) => Probe::Failed(err.to_string()),
        Ok(Err(join_err)) => Probe::Failed(format!("{what} aborted: {join_err}")),
        Err(_) => {
            abort.abort();
            Probe::Failed(format!("{what} timed out after {timeout:?}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FrameSize;
    use crate::providers::scripted::{ScriptedFaces, ScriptedObjects};

    fn frame() -> Frame {
        Frame::blank(0, FrameSize::new(640.0, 480.0))
    }

    #[tokio::test]
    async fn missing_provider_is_unavailable() {
        let probe = probe_faces(None, &frame(), Duration::from_millis(10)).await;
        assert_eq!(probe, Probe::Unavailable);
        assert!(probe.into_items().is_empty());
    }

    #[tokio::test]
    async fn provider_error_is_a_failed_probe() {
        let objects: Arc<dyn ObjectProvider> = Arc::new(
            ScriptedObjects::constant(vec![])
                .fail_once(ProviderError::DetectionFailed("gpu lost".into())),
        );
        let probe = probe_objects(Some(&objects), &frame(), Duration::from_secs(1)).await;
        assert_eq!(probe.failure(), Some("detection failed: gpu lost"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_provider_times_out() {
        let faces: Arc<dyn FaceProvider> =
            Arc::new(ScriptedFaces::constant(vec![]).with_latency(Duration::from_secs(5)));
        let probe = probe_faces(Some(&faces), &frame(), Duration::from_millis(500)).await;
        assert!(probe.failure().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn panicking_provider_is_a_failed_probe() {
        let faces: Arc<dyn FaceProvider> =
            Arc::new(ScriptedFaces::constant(vec![]).panicking("model crashed"));
        let probe = probe_faces(Some(&faces), &frame(), Duration::from_secs(1)).await;
        assert!(probe.failure().unwrap().contains("face detection aborted"));
        assert!(probe.into_items().is_empty());
    }

    #[test]
    fn coverage_descriptions() {
        assert!(!Coverage::full().is_degraded());
        let no_faces = Coverage {
            faces: false,
            objects: true,
        };
        assert!(no_faces.is_degraded());
        assert!(no_faces.describe().contains("face detection unavailable"));
        assert!(Coverage::none().is_empty());
    }
}
