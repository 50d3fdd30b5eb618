//! Disciplinary records.

pub mod model;

pub use model::Offense;
