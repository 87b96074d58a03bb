//! Hysteresis for the sustained conditions (looking away, absence, multiple
//! faces) and per-tick flagging of objects of interest.
//!
//! The engine is a pure step function over a `Copy` state: callers own the
//! state and feed it back on the next tick.

use crate::detection::{DetectionSettings, FocusSignal};
use crate::models::{Detection, EventKind, ScoredObject};

pub const FOCUS_LOST_DETAIL: &str = "User looking away > 5s";
pub const NO_FACE_DETAIL: &str = "No face detected > 10s";
pub const MULTIPLE_FACES_DETAIL: &str = "Multiple faces detected";

/// Enter/clear bookkeeping for one condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConditionState {
    /// An event was emitted and the negative signal has not been seen since.
    pub active: bool,
    /// Last tick at which the negative condition held.
    pub last_good_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceState {
    pub looking_away: ConditionState,
    /// `last_good_ms` is the last tick a face was seen.
    pub absence: ConditionState,
    pub multiple_faces: ConditionState,
}

impl DebounceState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// One full engine step: face conditions followed by object flagging.
pub fn tick(
    state: DebounceState,
    signal: &FocusSignal,
    objects: &[ScoredObject],
    now_ms: u64,
    settings: &DetectionSettings,
) -> (DebounceState, Vec<Detection>) {
    let (state, mut detections) = tick_faces(state, signal, now_ms, settings);
    detections.extend(flag_objects(objects, settings));
    (state, detections)
}

/// Advances the three hysteretic conditions.
pub fn tick_faces(
    mut state: DebounceState,
    signal: &FocusSignal,
    now_ms: u64,
    settings: &DetectionSettings,
) -> (DebounceState, Vec<Detection>) {
    let mut detections = Vec::new();

    // The absence clock starts with the session, not with the first face.
    if state.absence.last_good_ms.is_none() {
        state.absence.last_good_ms = Some(now_ms);
    }

    if signal.face_present {
        state.absence.last_good_ms = Some(now_ms);
        if !signal.looking_away {
            state.looking_away.last_good_ms = Some(now_ms);
        }
    }

    let focus_lost_for = state
        .looking_away
        .last_good_ms
        .map(|good| now_ms.saturating_sub(good));
    if signal.face_present
        && signal.looking_away
        && focus_lost_for.is_some_and(|ms| ms > settings.look_away_threshold_ms)
    {
        if !state.looking_away.active {
            state.looking_away.active = true;
            detections.push(Detection::new(EventKind::FocusLost, FOCUS_LOST_DETAIL));
        }
    } else if !signal.looking_away {
        state.looking_away.active = false;
    }

    let absent_for = state
        .absence
        .last_good_ms
        .map(|seen| now_ms.saturating_sub(seen));
    if !signal.face_present && absent_for.is_some_and(|ms| ms > settings.absence_threshold_ms) {
        if !state.absence.active {
            state.absence.active = true;
            detections.push(Detection::new(EventKind::NoFace, NO_FACE_DETAIL));
        }
    } else if signal.face_present {
        state.absence.active = false;
    }

    if signal.multiple_faces {
        if !state.multiple_faces.active {
            state.multiple_faces.active = true;
            detections.push(Detection::new(
                EventKind::MultipleFaces,
                MULTIPLE_FACES_DETAIL,
            ));
        }
    } else {
        state.multiple_faces.active = false;
        state.multiple_faces.last_good_ms = Some(now_ms);
    }

    (state, detections)
}

/// One `OBJECT` detection per qualifying object, every tick.
pub fn flag_objects(objects: &[ScoredObject], settings: &DetectionSettings) -> Vec<Detection> {
    objects
        .iter()
        .filter(|o| settings.is_of_interest(&o.label) && o.score >= settings.object_min_score)
        .map(|o| Detection::new(EventKind::Object, object_detail(o)))
        .collect()
}

pub fn object_detail(object: &ScoredObject) -> String {
    format!("{}: {}%", object.label, (object.score * 100.0).round() as i64)
}
