//! Upload intake and download.

pub mod service;

pub use service::{Download, UploadService};
