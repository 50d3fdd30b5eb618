//! Disciplinary records.

pub mod service;

pub use service::{OffenseRequest, OffenseService};
