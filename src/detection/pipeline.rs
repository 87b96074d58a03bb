use serde::{Deserialize, Serialize};

use crate::detection::{debounce, normalize_faces, DebounceState, DetectionSettings, FocusSignal};
use crate::models::{Detection, FrameSize, Sample};
use crate::providers::Coverage;

/// Operator-facing reading of the latest tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FocusStatus {
    FaceDetectionUnavailable,
    NoFace,
    MultipleFaces,
    LookingAway,
    Focused,
}

impl FocusStatus {
    pub fn from_signal(signal: &FocusSignal) -> Self {
        if !signal.face_present {
            FocusStatus::NoFace
        } else if signal.multiple_faces {
            FocusStatus::MultipleFaces
        } else if signal.looking_away {
            FocusStatus::LookingAway
        } else {
            FocusStatus::Focused
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FocusStatus::FaceDetectionUnavailable => "Face detection unavailable",
            FocusStatus::NoFace => "No face detected",
            FocusStatus::MultipleFaces => "Multiple faces detected",
            FocusStatus::LookingAway => "Looking away",
            FocusStatus::Focused => "Focused",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub status: FocusStatus,
    pub detections: Vec<Detection>,
}

/// Normalizer followed by the debounce engine, holding the per-session
/// condition state between ticks.
#[derive(Debug, Clone)]
pub struct SessionPipeline {
    settings: DetectionSettings,
    coverage: Coverage,
    state: DebounceState,
}

impl SessionPipeline {
    pub fn new(settings: DetectionSettings, coverage: Coverage) -> Self {
        Self {
            settings,
            coverage,
            state: DebounceState::new(),
        }
    }

    pub fn state(&self) -> &DebounceState {
        &self.state
    }

    pub fn coverage(&self) -> Coverage {
        self.coverage
    }

    pub fn settings(&self) -> &DetectionSettings {
        &self.settings
    }

    pub fn process(&mut self, sample: &Sample, frame: FrameSize, now_ms: u64) -> TickReport {
        let signal = normalize_faces(&sample.faces, frame, self.settings.gaze_radius);

        // Without a face provider every tick would read as "absent"; the
        // face conditions stay frozen instead.
        let (status, mut detections) = if self.coverage.faces {
            let (next, detections) =
                debounce::tick_faces(self.state, &signal, now_ms, &self.settings);
            self.state = next;
            (FocusStatus::from_signal(&signal), detections)
        } else {
            (FocusStatus::FaceDetectionUnavailable, Vec::new())
        };

        if self.coverage.objects {
            detections.extend(debounce::flag_objects(&sample.objects, &self.settings));
        }

        TickReport { status, detections }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EventKind, FaceBox, ScoredObject};

    const FRAME: FrameSize = FrameSize {
        width: 640.0,
        height: 480.0,
    };

    fn centered_face() -> FaceBox {
        FaceBox::new(280.0, 200.0, 80.0, 80.0)
    }

    #[test]
    fn full_coverage_reports_status_and_events() {
        let mut pipeline = SessionPipeline::new(DetectionSettings::default(), Coverage::full());

        let two = Sample::new(
            vec![centered_face(), FaceBox::new(0.0, 0.0, 40.0, 40.0)],
            vec![],
        );
        let report = pipeline.process(&two, FRAME, 0);
        assert_eq!(report.status, FocusStatus::MultipleFaces);
        assert_eq!(report.detections.len(), 1);
        assert_eq!(report.detections[0].kind, EventKind::MultipleFaces);

        let one = Sample::new(vec![centered_face()], vec![]);
        let report = pipeline.process(&one, FRAME, 200);
        assert_eq!(report.status, FocusStatus::Focused);
        assert!(report.detections.is_empty());
        assert!(!pipeline.state().multiple_faces.active);
    }

    #[test]
    fn missing_face_provider_freezes_face_conditions() {
        let coverage = Coverage {
            faces: false,
            objects: true,
        };
        let mut pipeline = SessionPipeline::new(DetectionSettings::default(), coverage);

        let sample = Sample::new(vec![], vec![ScoredObject::new("book", 0.9)]);
        let mut kinds = Vec::new();
        for i in 0..100 {
            let report = pipeline.process(&sample, FRAME, i * 200);
            assert_eq!(report.status, FocusStatus::FaceDetectionUnavailable);
            kinds.extend(report.detections.into_iter().map(|d| d.kind));
        }

        assert_eq!(kinds.len(), 100);
        assert!(kinds.iter().all(|k| *k == EventKind::Object));
        assert_eq!(pipeline.state(), &DebounceState::new());
    }

    #[test]
    fn missing_object_provider_ignores_objects() {
        let coverage = Coverage {
            faces: true,
            objects: false,
        };
        let mut pipeline = SessionPipeline::new(DetectionSettings::default(), coverage);
        let sample = Sample::new(vec![centered_face()], vec![ScoredObject::new("laptop", 0.95)]);
        assert!(pipeline.process(&sample, FRAME, 0).detections.is_empty());
    }
}
