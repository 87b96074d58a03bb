use std::sync::Arc;

use chrono::Utc;
use log::{error, info, warn};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use uuid::Uuid;

use crate::detection::SessionPipeline;
use crate::error::{SessionError, SessionResult};
use crate::models::{Event, SessionStatus};
use crate::providers::{Collaborators, LoadedProviders};
use crate::sampling::{SamplingController, SamplingJob};
use crate::scoring::{summarize, SessionSummary};
use crate::settings::MonitorSettings;

use super::archive::ArchivedSession;
use super::state::{SessionSnapshot, SessionState};

/// Drives one proctoring session at a time through
/// `Idle -> Running <-> Paused -> Stopped`.
///
/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    collaborators: Collaborators,
    settings: Arc<MonitorSettings>,
    // Held for the whole of every transition, which serializes them.
    sampler: Arc<Mutex<SamplingController>>,
    display: Arc<Mutex<Option<JoinHandle<()>>>>,
    snapshots: Arc<watch::Sender<SessionSnapshot>>,
}

impl SessionController {
    pub fn new(collaborators: Collaborators, settings: MonitorSettings) -> Self {
        let (snapshots, _) = watch::channel(SessionSnapshot::default());
        Self {
            state: Arc::new(Mutex::new(SessionState::new())),
            collaborators,
            settings: Arc::new(settings),
            sampler: Arc::new(Mutex::new(SamplingController::new())),
            display: Arc::new(Mutex::new(None)),
            snapshots: Arc::new(snapshots),
        }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock().await;
        state.snapshot(Instant::now(), &self.settings.scoring)
    }

    /// Receives a fresh snapshot on every transition and every display tick.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    pub async fn status(&self) -> SessionStatus {
        self.state.lock().await.status
    }

    /// Events of the active session, or of the last stopped one.
    pub async fn events(&self) -> Vec<Event> {
        let state = self.state.lock().await;
        match (state.active(), state.last()) {
            (Some(session), _) => session.log().events().to_vec(),
            (None, Some(last)) => last.events().to_vec(),
            (None, None) => Vec::new(),
        }
    }

    /// Summary of the active session so far, or of the last stopped one.
    pub async fn summary(&self) -> Option<SessionSummary> {
        let now = Instant::now();
        let state = self.state.lock().await;
        match (state.active(), state.last()) {
            (Some(session), _) => Some(summarize(
                session.log().events(),
                session.clock().active_ms(now),
                session.clock().paused_ms(now),
                &self.settings.scoring,
            )),
            (None, last) => last.map(|archive| archive.summary().clone()),
        }
    }

    pub async fn last_session(&self) -> Option<Arc<ArchivedSession>> {
        self.state.lock().await.last()
    }

    pub async fn start(&self) -> SessionResult<SessionSnapshot> {
        let mut sampler = self.sampler.lock().await;
        {
            let state = self.state.lock().await;
            if !matches!(state.status, SessionStatus::Idle | SessionStatus::Stopped) {
                return Err(SessionError::InvalidTransition {
                    from: state.status,
                    action: "start",
                });
            }
        }

        let source = self
            .collaborators
            .capture
            .acquire()
            .await
            .inspect_err(|err| error!("capture acquisition failed: {err}"))?;

        let providers = self.load_providers().await;
        let coverage = providers.coverage();
        if coverage.is_empty() {
            error!("no perception model could be loaded");
            return Err(SessionError::NoModelAvailable);
        }
        if coverage.is_degraded() {
            warn!("starting with degraded coverage: {}", coverage.describe());
        }

        let session_id = Uuid::new_v4().to_string();
        {
            let mut state = self.state.lock().await;
            let pipeline = SessionPipeline::new(self.settings.detection.clone(), coverage);
            state.begin(session_id.clone(), Utc::now(), pipeline, Instant::now())?;
        }

        if let Some(recorder) = &self.collaborators.recorder {
            recorder.start();
        }

        sampler.attach(
            source,
            SamplingJob {
                session_id: session_id.clone(),
                state: Arc::clone(&self.state),
                providers,
                settings: self.settings.sampling.clone(),
            },
        );
        if let Err(err) = sampler.start_sampling() {
            self.state.lock().await.cancel();
            sampler.release();
            return Err(err);
        }
        self.spawn_display_ticker().await;

        info!("session {session_id} started");
        Ok(self.publish().await)
    }

    pub async fn pause(&self) -> SessionResult<SessionSnapshot> {
        let mut sampler = self.sampler.lock().await;
        self.require(|status| status == SessionStatus::Running, "pause")
            .await?;

        sampler.stop_sampling().await;
        self.state
            .lock()
            .await
            .pause(Instant::now(), Utc::now())?;

        if let Some(recorder) = &self.collaborators.recorder {
            recorder.pause();
        }
        info!("session paused");
        Ok(self.publish().await)
    }

    pub async fn resume(&self) -> SessionResult<SessionSnapshot> {
        let mut sampler = self.sampler.lock().await;
        self.state
            .lock()
            .await
            .resume(Instant::now(), Utc::now())?;

        if let Some(recorder) = &self.collaborators.recorder {
            recorder.resume();
        }
        sampler.start_sampling()?;
        info!("session resumed");
        Ok(self.publish().await)
    }

    /// Ends the session and archives it. No tick can land after this returns.
    pub async fn stop(&self) -> SessionResult<Arc<ArchivedSession>> {
        let mut sampler = self.sampler.lock().await;
        self.require(|status| status.is_active(), "stop").await?;

        sampler.stop_sampling().await;
        let recording = self
            .collaborators
            .recorder
            .as_ref()
            .map(|recorder| recorder.stop())
            .unwrap_or_default();

        let archive = self.state.lock().await.finish(
            Instant::now(),
            Utc::now(),
            recording,
            &self.settings.scoring,
        )?;
        sampler.release();
        self.cancel_display_ticker().await;

        info!(
            "session {} stopped with {} events, integrity score {}",
            archive.info().id,
            archive.events().len(),
            archive.summary().integrity_score
        );
        self.publish().await;
        Ok(archive)
    }

    /// Abandons any active session without archiving it and returns to Idle.
    pub async fn reset(&self) -> SessionResult<()> {
        let mut sampler = self.sampler.lock().await;
        sampler.stop_sampling().await;

        let cancelled = self.state.lock().await.cancel();
        if let Some(session_id) = cancelled {
            if let Some(recorder) = &self.collaborators.recorder {
                let discarded = recorder.stop();
                info!("discarded {} recorded chunks", discarded.len());
            }
            info!("session {session_id} cancelled");
        }
        sampler.release();
        self.cancel_display_ticker().await;
        self.publish().await;
        Ok(())
    }

    /// Tags the active session with the candidate's name.
    pub async fn annotate_candidate(&self, name: &str) -> SessionResult<()> {
        self.state
            .lock()
            .await
            .annotate_candidate(name, Instant::now())?;
        self.publish().await;
        Ok(())
    }

    async fn load_providers(&self) -> LoadedProviders {
        let mut loaded = LoadedProviders::default();

        if let Some(faces) = &self.collaborators.faces {
            match faces.load().await {
                Ok(()) => loaded.faces = Some(Arc::clone(faces)),
                Err(err) => warn!("face detection unavailable: {err}"),
            }
        }
        if let Some(objects) = &self.collaborators.objects {
            match objects.load().await {
                Ok(()) => loaded.objects = Some(Arc::clone(objects)),
                Err(err) => warn!("object detection unavailable: {err}"),
            }
        }

        loaded
    }

    async fn require(
        &self,
        allowed: impl Fn(SessionStatus) -> bool,
        action: &'static str,
    ) -> SessionResult<()> {
        let from = self.state.lock().await.status;
        if allowed(from) {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition { from, action })
        }
    }

    async fn publish(&self) -> SessionSnapshot {
        let snapshot = self.snapshot().await;
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }

    async fn spawn_display_ticker(&self) {
        let mut ticker_guard = self.display.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let state = Arc::clone(&self.state);
        let snapshots = Arc::clone(&self.snapshots);
        let settings = Arc::clone(&self.settings);

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(settings.sampling.display_interval());
            loop {
                interval.tick().await;

                let snapshot = {
                    let guard = state.lock().await;
                    if !guard.status.is_active() {
                        break;
                    }
                    guard.snapshot(Instant::now(), &settings.scoring)
                };
                snapshots.send_replace(snapshot);
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_display_ticker(&self) {
        if let Some(handle) = self.display.lock().await.take() {
            handle.abort();
        }
    }
}
