//! Per-module switch for the high-frequency logs emitted from the sampling path.
//!
//! A module opts in by declaring the flag next to its imports:
//! ```ignore
//! const TICK_LOGS: bool = true;
//! use crate::tick_log;
//!
//! tick_log!(warn, "face probe failed: {reason}");
//! ```
//! Records go to the `proctorlens::tick` target so they can be silenced with
//! `RUST_LOG` without touching lifecycle logging.

pub const TICK_TARGET: &str = "proctorlens::tick";

#[macro_export]
macro_rules! tick_log {
    ($level:ident, $($arg:tt)+) => {
        if TICK_LOGS {
            log::$level!(target: $crate::utils::logging::TICK_TARGET, $($arg)+);
        }
    };
}
