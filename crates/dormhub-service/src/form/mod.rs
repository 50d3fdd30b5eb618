//! Service request workflow.

pub mod service;
pub mod workflow;

pub use service::FormService;
