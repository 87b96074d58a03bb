use serde::{Deserialize, Serialize};

/// Tunable thresholds for turning perception signals into events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectionSettings {
    /// Normalized distance of the main face from frame center beyond which
    /// the candidate counts as looking away (strictly greater).
    pub gaze_radius: f64,

    /// Continuous looking-away time before `FOCUS_LOST` fires.
    pub look_away_threshold_ms: u64,

    /// Continuous absence before `NO_FACE` fires.
    pub absence_threshold_ms: u64,

    /// Object detections below this confidence are ignored.
    pub object_min_score: f64,
    pub objects_of_interest: Vec<String>,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            gaze_radius: 0.35,
            look_away_threshold_ms: 5_000,
            absence_threshold_ms: 10_000,
            object_min_score: 0.6,
            objects_of_interest: ["cell phone", "book", "laptop", "keyboard", "remote"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl DetectionSettings {
    pub fn is_of_interest(&self, label: &str) -> bool {
        self.objects_of_interest.iter().any(|l| l == label)
    }
}
