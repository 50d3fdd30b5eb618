//! Dormitory news posts.

pub mod service;

pub use service::{NewsRequest, NewsService};
