//! Per-connection state and keepalive.

pub mod handle;
pub mod heartbeat;
