pub mod event;
pub mod pause;
pub mod sample;
pub mod session;

pub use event::{Detection, Event, EventKind};
pub use pause::Pause;
pub use sample::{BoundingBox, FaceBox, FrameSize, Sample, ScoredObject};
pub use session::{SessionInfo, SessionStatus};
