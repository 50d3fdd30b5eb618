//! # dormhub-api
//!
//! HTTP API layer for DormHub built on Axum.
//!
//! Provides the per-role REST route groups, the WebSocket upgrade,
//! middleware (role gating, CORS, logging), extractors, DTOs and error
//! mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, build_state, run_server};
pub use error::ApiError;
pub use state::AppState;
