//! Realtime wire protocol.

pub mod types;
