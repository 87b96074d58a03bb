pub mod export;
pub mod log;

pub use export::{format_elapsed, parse_table, to_table, ExportError, TableRow};
pub use log::{count_kind, EventLog};
