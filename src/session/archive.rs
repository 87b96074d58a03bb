use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::to_table;
use crate::models::{Event, Pause, SessionInfo};
use crate::providers::{Coverage, MediaChunk};
use crate::scoring::{candidate_name, SessionSummary};

/// A stopped session. The event log is frozen: it can be read and exported
/// but never appended to.
#[derive(Debug)]
pub struct ArchivedSession {
    info: SessionInfo,
    events: Vec<Event>,
    summary: SessionSummary,
    pauses: Vec<Pause>,
    coverage: Coverage,
    recording: Vec<MediaChunk>,
}

impl ArchivedSession {
    pub(crate) fn new(
        info: SessionInfo,
        events: Vec<Event>,
        summary: SessionSummary,
        pauses: Vec<Pause>,
        coverage: Coverage,
        recording: Vec<MediaChunk>,
    ) -> Self {
        Self {
            info,
            events,
            summary,
            pauses,
            coverage,
            recording,
        }
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    pub fn pauses(&self) -> &[Pause] {
        &self.pauses
    }

    pub fn coverage(&self) -> Coverage {
        self.coverage
    }

    /// Recorder output, in recording order.
    pub fn recording(&self) -> &[MediaChunk] {
        &self.recording
    }

    pub fn candidate(&self) -> Option<String> {
        candidate_name(&self.events)
    }

    pub fn export_table(&self) -> String {
        to_table(&self.events)
    }

    pub fn report(&self) -> Report {
        Report {
            session_id: self.info.id.clone(),
            started_at: self.info.started_at,
            stopped_at: self.info.stopped_at,
            candidate: self.candidate(),
            coverage: self.coverage,
            summary: self.summary.clone(),
        }
    }
}

/// End-of-session report handed to renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub stopped_at: Option<DateTime<Utc>>,
    pub candidate: Option<String>,
    pub coverage: Coverage,
    pub summary: SessionSummary,
}

impl Report {
    pub fn render_text(&self) -> String {
        let mut lines = Vec::new();
        if let Some(candidate) = &self.candidate {
            lines.push(format!("Candidate: {candidate}"));
        }
        lines.push(format!(
            "Session: {} ({})",
            self.session_id,
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        if self.coverage.is_degraded() {
            lines.push(format!("Coverage: {}", self.coverage.describe()));
        }
        lines.push(self.summary.render_text());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventKind, SessionStatus};
    use crate::scoring::{summarize, ScoringWeights};

    fn archive(coverage: Coverage) -> ArchivedSession {
        let events = vec![
            Event::new(0, EventKind::Meta, "Candidate: Grace"),
            Event::new(1_400, EventKind::Object, "cell phone: 82%"),
            Event::new(2_000, EventKind::Meta, "Session ended"),
        ];
        let summary = summarize(&events, 2_000, 0, &ScoringWeights::default());
        let info = SessionInfo {
            id: "abc".into(),
            started_at: Utc::now(),
            stopped_at: Some(Utc::now()),
            status: SessionStatus::Stopped,
            active_ms: 2_000,
            paused_ms: 0,
        };
        ArchivedSession::new(info, events, summary, Vec::new(), coverage, Vec::new())
    }

    #[test]
    fn report_carries_candidate_and_score() {
        let report = archive(Coverage::full()).report();
        assert_eq!(report.candidate.as_deref(), Some("Grace"));
        assert_eq!(report.summary.integrity_score, 98);

        let text = report.render_text();
        assert!(text.starts_with("Candidate: Grace"));
        assert!(text.contains("Integrity Score: 98"));
        assert!(!text.contains("Coverage:"));
    }

    #[test]
    fn degraded_coverage_is_reported() {
        let report = archive(Coverage {
            faces: true,
            objects: false,
        })
        .report();
        assert!(report
            .render_text()
            .contains("Coverage: object flagging disabled"));
    }

    #[test]
    fn export_lists_every_event() {
        let table = archive(Coverage::full()).export_table();
        assert_eq!(table.lines().count(), 4);
        assert!(table.contains("00:01,OBJECT,cell phone: 82%"));
    }
}
