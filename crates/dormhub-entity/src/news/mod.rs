//! News posts.

pub mod model;

pub use model::News;
