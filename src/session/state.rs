use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::detection::{FocusStatus, SessionPipeline, TickReport};
use crate::error::{SessionError, SessionResult};
use crate::events::EventLog;
use crate::models::{EventKind, FrameSize, Pause, Sample, SessionInfo, SessionStatus};
use crate::providers::{Coverage, MediaChunk};
use crate::scoring::{integrity_score, summarize, ScoringWeights, CANDIDATE_PREFIX};

use super::archive::ArchivedSession;

pub const PAUSED_DETAIL: &str = "Session paused";
pub const RESUMED_DETAIL: &str = "Session resumed";
pub const ENDED_DETAIL: &str = "Session ended";

/// Active/paused time split for one session.
///
/// Time accumulated in earlier windows lives in the baselines; the open window
/// is measured from its anchor. Exactly one anchor is set while the session
/// is active, none once it is frozen.
#[derive(Debug, Clone)]
pub struct SessionClock {
    active_ms_baseline: u64,
    running_anchor: Option<Instant>,
    paused_ms_baseline: u64,
    pause_anchor: Option<Instant>,
}

impl SessionClock {
    pub fn started(now: Instant) -> Self {
        Self {
            active_ms_baseline: 0,
            running_anchor: Some(now),
            paused_ms_baseline: 0,
            pause_anchor: None,
        }
    }

    pub fn active_ms(&self, now: Instant) -> u64 {
        self.active_ms_baseline
            .saturating_add(window_ms(self.running_anchor, now))
    }

    pub fn paused_ms(&self, now: Instant) -> u64 {
        self.paused_ms_baseline
            .saturating_add(window_ms(self.pause_anchor, now))
    }

    pub fn pause(&mut self, now: Instant) {
        self.active_ms_baseline = self.active_ms(now);
        self.running_anchor = None;
        self.pause_anchor.get_or_insert(now);
    }

    /// Closes the pause window and returns its length.
    pub fn resume(&mut self, now: Instant) -> u64 {
        let window = window_ms(self.pause_anchor, now);
        self.paused_ms_baseline = self.paused_ms_baseline.saturating_add(window);
        self.pause_anchor = None;
        self.running_anchor.get_or_insert(now);
        window
    }

    pub fn freeze(&mut self, now: Instant) {
        self.active_ms_baseline = self.active_ms(now);
        self.paused_ms_baseline = self.paused_ms(now);
        self.running_anchor = None;
        self.pause_anchor = None;
    }
}

fn window_ms(anchor: Option<Instant>, now: Instant) -> u64 {
    anchor
        .map(|anchor| now.saturating_duration_since(anchor).as_millis() as u64)
        .unwrap_or(0)
}

#[derive(Debug)]
pub struct ActiveSession {
    pub id: String,
    pub started_at: DateTime<Utc>,
    clock: SessionClock,
    log: EventLog,
    pipeline: SessionPipeline,
    pauses: Vec<Pause>,
    focus: Option<FocusStatus>,
}

impl ActiveSession {
    pub fn coverage(&self) -> Coverage {
        self.pipeline.coverage()
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn pauses(&self) -> &[Pause] {
        &self.pauses
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }
}

/// Live view of the controller, published to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub session_id: Option<String>,
    pub active_ms: u64,
    pub paused_ms: u64,
    pub focus: Option<FocusStatus>,
    pub integrity_score: Option<u32>,
    pub event_count: usize,
    pub coverage: Option<Coverage>,
}

#[derive(Debug, Default)]
pub struct SessionState {
    pub status: SessionStatus,
    active: Option<ActiveSession>,
    last: Option<Arc<ArchivedSession>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    pub fn last(&self) -> Option<Arc<ArchivedSession>> {
        self.last.clone()
    }

    pub fn begin(
        &mut self,
        id: String,
        started_at: DateTime<Utc>,
        pipeline: SessionPipeline,
        now: Instant,
    ) -> SessionResult<()> {
        self.ensure(
            matches!(self.status, SessionStatus::Idle | SessionStatus::Stopped),
            "start",
        )?;
        self.active = Some(ActiveSession {
            id,
            started_at,
            clock: SessionClock::started(now),
            log: EventLog::new(),
            pipeline,
            pauses: Vec::new(),
            focus: None,
        });
        self.status = SessionStatus::Running;
        Ok(())
    }

    /// Runs one sample through the pipeline and appends its detections.
    ///
    /// Samples for a session that is no longer running, or that was replaced,
    /// are dropped.
    pub fn apply_tick(
        &mut self,
        session_id: &str,
        sample: &Sample,
        frame: FrameSize,
        now: Instant,
    ) -> Option<TickReport> {
        if self.status != SessionStatus::Running {
            return None;
        }
        let session = self.active.as_mut().filter(|s| s.id == session_id)?;

        let now_ms = session.clock.active_ms(now);
        let report = session.pipeline.process(sample, frame, now_ms);
        for detection in &report.detections {
            session
                .log
                .append(now_ms, detection.kind, detection.detail.clone());
        }
        session.focus = Some(report.status);
        Some(report)
    }

    pub fn pause(&mut self, now: Instant, wall: DateTime<Utc>) -> SessionResult<()> {
        self.ensure(self.status == SessionStatus::Running, "pause")?;
        let session = self.active_mut("pause")?;

        let at_ms = session.clock.active_ms(now);
        session.clock.pause(now);
        session.log.append(at_ms, EventKind::Meta, PAUSED_DETAIL);
        session.pauses.push(Pause::open(&session.id, at_ms, wall));
        self.status = SessionStatus::Paused;
        Ok(())
    }

    pub fn resume(&mut self, now: Instant, wall: DateTime<Utc>) -> SessionResult<()> {
        self.ensure(self.status == SessionStatus::Paused, "resume")?;
        let session = self.active_mut("resume")?;

        let duration_ms = session.clock.resume(now);
        if let Some(pause) = session.pauses.iter_mut().rev().find(|p| p.is_open()) {
            pause.close(wall, duration_ms);
        }
        let at_ms = session.clock.active_ms(now);
        session.log.append(at_ms, EventKind::Meta, RESUMED_DETAIL);
        self.status = SessionStatus::Running;
        Ok(())
    }

    pub fn annotate_candidate(&mut self, name: &str, now: Instant) -> SessionResult<()> {
        self.ensure(self.status.is_active(), "annotate")?;
        let session = self.active_mut("annotate")?;
        let at_ms = session.clock.active_ms(now);
        session
            .log
            .append(at_ms, EventKind::Meta, format!("{CANDIDATE_PREFIX}{}", name.trim()));
        Ok(())
    }

    /// Closes the active session and moves its log into an archive.
    pub fn finish(
        &mut self,
        now: Instant,
        wall: DateTime<Utc>,
        recording: Vec<MediaChunk>,
        weights: &ScoringWeights,
    ) -> SessionResult<Arc<ArchivedSession>> {
        self.ensure(self.status.is_active(), "stop")?;
        let Some(mut session) = self.active.take() else {
            return Err(self.invalid("stop"));
        };

        if let Some(pause) = session.pauses.iter_mut().rev().find(|p| p.is_open()) {
            let open_ms = window_ms(session.clock.pause_anchor, now);
            pause.close(wall, open_ms);
        }
        let active_ms = session.clock.active_ms(now);
        session.clock.freeze(now);
        let paused_ms = session.clock.paused_ms(now);
        session.log.append(active_ms, EventKind::Meta, ENDED_DETAIL);

        let events = session.log.into_events();
        let summary = summarize(&events, active_ms, paused_ms, weights);
        let info = SessionInfo {
            id: session.id,
            started_at: session.started_at,
            stopped_at: Some(wall),
            status: SessionStatus::Stopped,
            active_ms,
            paused_ms,
        };
        let archive = Arc::new(ArchivedSession::new(
            info,
            events,
            summary,
            session.pauses,
            session.pipeline.coverage(),
            recording,
        ));

        self.last = Some(Arc::clone(&archive));
        self.status = SessionStatus::Stopped;
        Ok(archive)
    }

    /// Drops the active session without archiving it.
    pub fn cancel(&mut self) -> Option<String> {
        self.status = SessionStatus::Idle;
        self.active.take().map(|session| session.id)
    }

    pub fn snapshot(&self, now: Instant, weights: &ScoringWeights) -> SessionSnapshot {
        match (&self.active, &self.last) {
            (Some(session), _) => SessionSnapshot {
                status: self.status,
                session_id: Some(session.id.clone()),
                active_ms: session.clock.active_ms(now),
                paused_ms: session.clock.paused_ms(now),
                focus: session.focus,
                integrity_score: Some(integrity_score(session.log.events(), weights)),
                event_count: session.log.len(),
                coverage: Some(session.coverage()),
            },
            (None, Some(last)) if self.status == SessionStatus::Stopped => SessionSnapshot {
                status: self.status,
                session_id: Some(last.info().id.clone()),
                active_ms: last.info().active_ms,
                paused_ms: last.info().paused_ms,
                focus: None,
                integrity_score: Some(last.summary().integrity_score),
                event_count: last.events().len(),
                coverage: Some(last.coverage()),
            },
            _ => SessionSnapshot {
                status: self.status,
                ..SessionSnapshot::default()
            },
        }
    }

    fn ensure(&self, allowed: bool, action: &'static str) -> SessionResult<()> {
        if allowed {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            from: self.status,
            action,
        }
    }

    fn active_mut(&mut self, action: &'static str) -> SessionResult<&mut ActiveSession> {
        let from = self.status;
        self.active
            .as_mut()
            .ok_or(SessionError::InvalidTransition { from, action })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::DetectionSettings;
    use crate::models::FaceBox;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    const FRAME: FrameSize = FrameSize {
        width: 640.0,
        height: 480.0,
    };

    fn running(now: Instant) -> SessionState {
        let mut state = SessionState::new();
        let pipeline = SessionPipeline::new(DetectionSettings::default(), Coverage::full());
        state
            .begin("s-1".into(), Utc::now(), pipeline, now)
            .unwrap();
        state
    }

    #[test]
    fn clock_excludes_paused_time() {
        let t0 = Instant::now();
        let mut clock = SessionClock::started(t0);
        clock.pause(t0 + Duration::from_secs(3));
        assert_eq!(clock.active_ms(t0 + Duration::from_secs(10)), 3_000);
        assert_eq!(clock.resume(t0 + Duration::from_secs(10)), 7_000);
        assert_eq!(clock.active_ms(t0 + Duration::from_secs(12)), 5_000);
        clock.freeze(t0 + Duration::from_secs(12));
        assert_eq!(clock.active_ms(t0 + Duration::from_secs(60)), 5_000);
        assert_eq!(clock.paused_ms(t0 + Duration::from_secs(60)), 7_000);
    }

    #[test]
    fn ticks_for_other_sessions_are_dropped() {
        let t0 = Instant::now();
        let mut state = running(t0);
        let sample = Sample::new(vec![], vec![]);
        assert!(state.apply_tick("other", &sample, FRAME, t0).is_none());
        assert!(state.apply_tick("s-1", &sample, FRAME, t0).is_some());
    }

    #[test]
    fn paused_session_ignores_ticks_and_logs_meta() {
        let t0 = Instant::now();
        let mut state = running(t0);
        state.pause(t0 + Duration::from_secs(1), Utc::now()).unwrap();

        let two = Sample::new(
            vec![
                FaceBox::new(280.0, 200.0, 80.0, 80.0),
                FaceBox::new(0.0, 0.0, 40.0, 40.0),
            ],
            vec![],
        );
        assert!(state
            .apply_tick("s-1", &two, FRAME, t0 + Duration::from_secs(2))
            .is_none());

        state.resume(t0 + Duration::from_secs(4), Utc::now()).unwrap();
        let session = state.active().unwrap();
        let details: Vec<_> = session
            .log()
            .events()
            .iter()
            .map(|e| (e.time_ms, e.detail.as_str()))
            .collect();
        assert_eq!(details, vec![(1_000, PAUSED_DETAIL), (1_000, RESUMED_DETAIL)]);
        assert_eq!(session.pauses()[0].duration_ms, Some(3_000));
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let t0 = Instant::now();
        let mut state = SessionState::new();
        assert!(matches!(
            state.pause(t0, Utc::now()),
            Err(SessionError::InvalidTransition {
                from: SessionStatus::Idle,
                action: "pause"
            })
        ));

        let mut state = running(t0);
        assert!(matches!(
            state.resume(t0, Utc::now()),
            Err(SessionError::InvalidTransition {
                from: SessionStatus::Running,
                ..
            })
        ));
        let pipeline = SessionPipeline::new(DetectionSettings::default(), Coverage::full());
        assert!(state.begin("s-2".into(), Utc::now(), pipeline, t0).is_err());
    }

    #[test]
    fn finish_archives_and_closes_open_pause() {
        let t0 = Instant::now();
        let mut state = running(t0);
        state
            .annotate_candidate(" Ada ", t0 + Duration::from_millis(500))
            .unwrap();
        state.pause(t0 + Duration::from_secs(2), Utc::now()).unwrap();

        let archive = state
            .finish(
                t0 + Duration::from_secs(5),
                Utc::now(),
                Vec::new(),
                &ScoringWeights::default(),
            )
            .unwrap();

        assert_eq!(state.status, SessionStatus::Stopped);
        assert!(state.active().is_none());
        assert_eq!(archive.info().active_ms, 2_000);
        assert_eq!(archive.info().paused_ms, 3_000);
        assert_eq!(archive.pauses()[0].duration_ms, Some(3_000));
        assert_eq!(archive.candidate().as_deref(), Some("Ada"));
        assert_eq!(archive.events().last().unwrap().detail, ENDED_DETAIL);
        assert_eq!(archive.summary().integrity_score, 100);

        let snapshot = state.snapshot(t0 + Duration::from_secs(9), &ScoringWeights::default());
        assert_eq!(snapshot.status, SessionStatus::Stopped);
        assert_eq!(snapshot.active_ms, 2_000);
    }

    #[test]
    fn cancel_returns_to_idle_without_archive() {
        let t0 = Instant::now();
        let mut state = running(t0);
        assert_eq!(state.cancel().as_deref(), Some("s-1"));
        assert_eq!(state.status, SessionStatus::Idle);
        assert!(state.last().is_none());
    }
}
