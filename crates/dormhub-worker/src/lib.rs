//! Scheduled background sweeps for DormHub.
//!
//! This crate provides:
//! - A job executor that dispatches a named job to its handler
//! - A cron scheduler that fires jobs on the configured schedules
//! - The overdue bill and overdue form sweeps

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use scheduler::CronScheduler;
