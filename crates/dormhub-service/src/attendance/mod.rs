//! Curfew management and daily check-in logging.

pub mod service;
pub mod store;

pub use service::AttendanceService;
pub use store::{CurfewStore, LogStore};
