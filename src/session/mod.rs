pub mod archive;
pub mod controller;
pub mod state;

pub use archive::{ArchivedSession, Report};
pub use controller::SessionController;
pub use state::{SessionClock, SessionSnapshot, SessionState};
