//! # dormhub-realtime
//!
//! Realtime delivery for DormHub. Provides:
//!
//! - a [`DeliveryRegistry`] mapping each account to at most one live
//!   WebSocket connection, with role groups for broadcasts
//! - at-most-once notification pushes via a per-recipient de-dup set
//! - the JSON event protocol spoken over the socket
//! - a heartbeat loop that detects dead connections

pub mod connection;
pub mod message;
pub mod metrics;
pub mod registry;

pub use connection::handle::{ConnectionHandle, ConnectionId, SendOutcome};
pub use message::types::{EmitTarget, InboundMessage, OutboundEvent};
pub use metrics::{RealtimeMetrics, RealtimeStats};
pub use registry::{DeliveryRegistry, PushReport};
