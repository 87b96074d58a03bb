use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::events::{count_kind, format_elapsed};
use crate::models::{Event, EventKind};
use crate::scoring::{integrity_score, ScoringWeights};

pub const CANDIDATE_PREFIX: &str = "Candidate: ";

/// Projection of an event log; holds nothing the log does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub duration_ms: u64,
    pub paused_ms: u64,
    pub focus_lost: usize,
    pub no_face: usize,
    pub multiple_faces: usize,
    pub object_events: usize,
    pub flagged_objects: BTreeSet<String>,
    pub integrity_score: u32,
}

pub fn summarize(
    events: &[Event],
    duration_ms: u64,
    paused_ms: u64,
    weights: &ScoringWeights,
) -> SessionSummary {
    SessionSummary {
        duration_ms,
        paused_ms,
        focus_lost: count_kind(events, EventKind::FocusLost),
        no_face: count_kind(events, EventKind::NoFace),
        multiple_faces: count_kind(events, EventKind::MultipleFaces),
        object_events: count_kind(events, EventKind::Object),
        flagged_objects: flagged_objects(events),
        integrity_score: integrity_score(events, weights),
    }
}

/// Distinct labels of `OBJECT` events, taken from the text before `:`.
pub fn flagged_objects(events: &[Event]) -> BTreeSet<String> {
    events
        .iter()
        .filter(|e| e.kind == EventKind::Object)
        .filter_map(|e| e.detail.split(':').next())
        .map(|label| label.trim().to_string())
        .filter(|label| !label.is_empty())
        .collect()
}

/// Most recent candidate annotation, if any.
pub fn candidate_name(events: &[Event]) -> Option<String> {
    events
        .iter()
        .rev()
        .filter(|e| e.kind == EventKind::Meta)
        .find_map(|e| e.detail.strip_prefix(CANDIDATE_PREFIX))
        .map(str::to_string)
}

impl SessionSummary {
    /// Plain-text block for renderers that do not consume the JSON form.
    pub fn render_text(&self) -> String {
        let types = if self.flagged_objects.is_empty() {
            "None".to_string()
        } else {
            self.flagged_objects
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut lines = vec![format!(
            "Interview Duration: {}",
            format_elapsed(self.duration_ms)
        )];
        if self.paused_ms > 0 {
            lines.push(format!("Paused: {}", format_elapsed(self.paused_ms)));
        }
        lines.push(format!(
            "Focus Lost: {} | No Face: {} | Multiple Faces: {}",
            self.focus_lost, self.no_face, self.multiple_faces
        ));
        lines.push(format!(
            "Suspicious Objects: {} (Types: {})",
            self.object_events, types
        ));
        lines.push(format!("Integrity Score: {}", self.integrity_score));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_log() -> Vec<Event> {
        vec![
            Event::new(0, EventKind::MultipleFaces, "Multiple faces detected"),
            Event::new(400, EventKind::Object, "cell phone: 82%"),
            Event::new(600, EventKind::Object, "cell phone: 80%"),
            Event::new(800, EventKind::Object, "book: 66%"),
            Event::new(5_200, EventKind::FocusLost, "User looking away > 5s"),
            Event::new(9_000, EventKind::Meta, "Candidate: Ada"),
        ]
    }

    #[test]
    fn counts_labels_and_score() {
        let summary = summarize(&sample_log(), 61_000, 0, &ScoringWeights::default());
        assert_eq!(summary.multiple_faces, 1);
        assert_eq!(summary.object_events, 3);
        assert_eq!(summary.focus_lost, 1);
        assert_eq!(summary.no_face, 0);
        assert_eq!(
            summary.flagged_objects.into_iter().collect::<Vec<_>>(),
            vec!["book".to_string(), "cell phone".to_string()]
        );
        // 5 + 3*2 + 2
        assert_eq!(summary.integrity_score, 87);
    }

    #[test]
    fn projection_is_idempotent() {
        let log = sample_log();
        let weights = ScoringWeights::default();
        assert_eq!(
            summarize(&log, 1_000, 50, &weights),
            summarize(&log, 1_000, 50, &weights)
        );
    }

    #[test]
    fn finds_latest_candidate_annotation() {
        let mut log = sample_log();
        assert_eq!(candidate_name(&log), Some("Ada".to_string()));
        log.push(Event::new(9_500, EventKind::Meta, "Candidate: Grace"));
        assert_eq!(candidate_name(&log), Some("Grace".to_string()));
        assert_eq!(candidate_name(&[]), None);
    }

    #[test]
    fn renders_text_block() {
        let summary = summarize(&sample_log(), 61_000, 0, &ScoringWeights::default());
        assert_eq!(
            summary.render_text(),
            "Interview Duration: 01:01\n\
             Focus Lost: 1 | No Face: 0 | Multiple Faces: 1\n\
             Suspicious Objects: 3 (Types: book, cell phone)\n\
             Integrity Score: 87"
        );
    }
}
