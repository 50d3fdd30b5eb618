//! Curfew and daily check-in logs.

pub mod curfew;
pub mod log;

pub use curfew::Curfew;
pub use log::{AttendanceStatus, Log, LogEntry};
