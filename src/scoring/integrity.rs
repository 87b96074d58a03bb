use crate::models::Event;
use crate::scoring::ScoringWeights;

pub const MAX_SCORE: u32 = 100;

/// Total deduction of a log. Saturates rather than overflowing on very long
/// sessions.
pub fn deductions(events: &[Event], weights: &ScoringWeights) -> u32 {
    events
        .iter()
        .fold(0u32, |acc, e| acc.saturating_add(weights.weight(e.kind)))
}

/// `max(0, 100 - deductions)`, recomputed from scratch on every call.
pub fn integrity_score(events: &[Event], weights: &ScoringWeights) -> u32 {
    MAX_SCORE.saturating_sub(deductions(events, weights))
}
