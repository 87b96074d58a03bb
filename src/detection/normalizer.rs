//! Face-set normalization
//!
//! Reduces the faces detected during one tick to a [`FocusSignal`]:
//! - presence and multiplicity from the face count
//! - gaze deviation from the offset of the largest face to frame center

use serde::Serialize;

use crate::models::{FaceBox, FrameSize};

/// Heuristic gaze radius used when no settings are supplied.
pub const DEFAULT_GAZE_RADIUS: f64 = 0.35;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FocusSignal {
    pub face_present: bool,
    pub multiple_faces: bool,
    pub looking_away: bool,
}

impl FocusSignal {
    pub fn absent() -> Self {
        Self::default()
    }
}

pub fn normalize_faces(faces: &[FaceBox], frame: FrameSize, gaze_radius: f64) -> FocusSignal {
    let Some(main) = main_face(faces) else {
        return FocusSignal::absent();
    };

    let looking_away = gaze_deviation(main, frame)
        .map(|(dx, dy)| dx * dx + dy * dy > gaze_radius * gaze_radius)
        .unwrap_or(false);

    FocusSignal {
        face_present: true,
        multiple_faces: faces.len() > 1,
        looking_away,
    }
}

/// Largest face by area; the earliest one wins ties.
pub fn main_face(faces: &[FaceBox]) -> Option<&FaceBox> {
    faces.iter().fold(None, |best: Option<&FaceBox>, face| match best {
        Some(current) if face.area() <= current.area() => Some(current),
        _ => Some(face),
    })
}

/// Offset of the face center from the frame center, each axis scaled by
/// half the frame dimension. `None` for a degenerate frame.
pub fn gaze_deviation(face: &FaceBox, frame: FrameSize) -> Option<(f64, f64)> {
    let half_w = frame.width / 2.0;
    let half_h = frame.height / 2.0;
    if half_w <= 0.0 || half_h <= 0.0 {
        return None;
    }

    let (face_x, face_y) = face.center();
    let (frame_x, frame_y) = frame.center();
    Some(((face_x - frame_x) / half_w, (face_y - frame_y) / half_h))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: FrameSize = FrameSize {
        width: 200.0,
        height: 200.0,
    };

    fn centered(size: f64) -> FaceBox {
        FaceBox::new(100.0 - size / 2.0, 100.0 - size / 2.0, size, size)
    }

    #[test]
    fn no_faces_is_all_false() {
        assert_eq!(
            normalize_faces(&[], FRAME, DEFAULT_GAZE_RADIUS),
            FocusSignal {
                face_present: false,
                multiple_faces: false,
                looking_away: false,
            }
        );
    }

    #[test]
    fn single_centered_face_is_focused() {
        let signal = normalize_faces(&[centered(40.0)], FRAME, DEFAULT_GAZE_RADIUS);
        assert!(signal.face_present);
        assert!(!signal.multiple_faces);
        assert!(!signal.looking_away);
    }

    #[test]
    fn two_faces_flag_multiplicity() {
        let faces = [centered(40.0), FaceBox::new(0.0, 0.0, 10.0, 10.0)];
        let signal = normalize_faces(&faces, FRAME, DEFAULT_GAZE_RADIUS);
        assert!(signal.face_present);
        assert!(signal.multiple_faces);
        // the large centered face drives gaze, not the small corner one
        assert!(!signal.looking_away);
    }

    #[test]
    fn main_face_is_largest_and_first_on_ties() {
        let first = FaceBox::new(0.0, 0.0, 20.0, 20.0);
        let second = FaceBox::new(50.0, 50.0, 20.0, 20.0);
        let big = FaceBox::new(10.0, 10.0, 30.0, 30.0);

        assert_eq!(main_face(&[first, second]), Some(&first));
        assert_eq!(main_face(&[first, big, second]), Some(&big));
        assert_eq!(main_face(&[]), None);
    }

    #[test]
    fn gaze_distance_exactly_at_radius_is_not_looking_away() {
        // center x = 135 -> dx = 35 / 100 = 0.35
        let face = FaceBox::new(125.0, 90.0, 20.0, 20.0);
        let (dx, dy) = gaze_deviation(&face, FRAME).unwrap();
        assert_eq!(dx, 0.35);
        assert_eq!(dy, 0.0);
        assert!(!normalize_faces(&[face], FRAME, 0.35).looking_away);
    }

    #[test]
    fn gaze_past_radius_is_looking_away() {
        let face = FaceBox::new(130.0, 90.0, 20.0, 20.0);
        assert!(normalize_faces(&[face], FRAME, 0.35).looking_away);

        // diagonal: dx = dy = 0.3 -> distance ~0.42
        let diagonal = FaceBox::new(120.0, 120.0, 20.0, 20.0);
        assert!(normalize_faces(&[diagonal], FRAME, 0.35).looking_away);
    }

    #[test]
    fn degenerate_frame_never_looks_away() {
        let signal = normalize_faces(
            &[FaceBox::new(500.0, 500.0, 10.0, 10.0)],
            FrameSize::new(0.0, 0.0),
            DEFAULT_GAZE_RADIUS,
        );
        assert!(signal.face_present);
        assert!(!signal.looking_away);
    }
}
