pub mod config;
pub mod integrity;
pub mod summary;

pub use config::ScoringWeights;
pub use integrity::{deductions, integrity_score, MAX_SCORE};
pub use summary::{candidate_name, flagged_objects, summarize, SessionSummary, CANDIDATE_PREFIX};
