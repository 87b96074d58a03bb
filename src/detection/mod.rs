pub mod config;
pub mod debounce;
pub mod normalizer;
pub mod pipeline;

pub use config::DetectionSettings;
pub use debounce::{tick, ConditionState, DebounceState};
pub use normalizer::{normalize_faces, FocusSignal};
pub use pipeline::{FocusStatus, SessionPipeline, TickReport};
