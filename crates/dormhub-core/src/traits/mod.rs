//! Core traits defined in `dormhub-core` and implemented by other crates.

pub mod storage;

pub use storage::StorageProvider;
