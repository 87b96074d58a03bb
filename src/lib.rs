//! Proctoring integrity engine.
//!
//! Per-frame face and object detections go in; debounced integrity events, a
//! live integrity score and an end-of-session report come out. Capture and
//! perception are injected through the traits in [`providers`].

pub mod detection;
pub mod error;
pub mod events;
pub mod models;
pub mod providers;
pub mod replay;
pub mod sampling;
pub mod scoring;
pub mod session;
pub mod settings;
pub mod utils;

pub use error::{AcquisitionError, ProviderError, SessionError, SessionResult};
pub use models::{Event, EventKind, SessionStatus};
pub use providers::{Collaborators, Coverage};
pub use scoring::SessionSummary;
pub use session::{ArchivedSession, Report, SessionController, SessionSnapshot};
pub use settings::{MonitorSettings, SettingsStore};

/// Initializes `env_logger`; `RUST_LOG` overrides the `info` default.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}
