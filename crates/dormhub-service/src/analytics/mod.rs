//! Admin dashboard figures.

pub mod service;

pub use service::{AnalyticsService, Dashboard};
