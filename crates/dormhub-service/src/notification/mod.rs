//! Notification inbox and fan-out rules.

pub mod rules;
pub mod service;

pub use service::NotificationService;
