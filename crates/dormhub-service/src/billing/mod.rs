//! Bills, payments and the overdue sweep.

pub mod service;

pub use service::{BillingService, PaymentRequest};
