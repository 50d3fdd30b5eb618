//! # dormhub-storage
//!
//! Upload storage for DormHub: form attachments, bill receipts and news
//! images live on the local filesystem under per-category directories.

pub mod policy;
pub mod providers;

pub use policy::{UploadCategory, UploadPolicy};
pub use providers::local::LocalStorageProvider;
