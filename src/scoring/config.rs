use serde::{Deserialize, Serialize};

use crate::models::EventKind;

/// Points deducted from 100 per event of each kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoringWeights {
    pub focus_lost: u32,
    pub no_face: u32,
    pub multiple_faces: u32,
    pub object: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            focus_lost: 2,
            no_face: 3,
            multiple_faces: 5,
            object: 2,
        }
    }
}

impl ScoringWeights {
    pub fn weight(&self, kind: EventKind) -> u32 {
        match kind {
            EventKind::FocusLost => self.focus_lost,
            EventKind::NoFace => self.no_face,
            EventKind::MultipleFaces => self.multiple_faces,
            EventKind::Object => self.object,
            EventKind::Meta => 0,
        }
    }
}
