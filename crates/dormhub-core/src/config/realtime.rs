//! Real-time WebSocket delivery configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) delivery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Bounded outbound queue length per connection.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
    /// WebSocket ping interval in seconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval_seconds: u64,
    /// Seconds without any inbound frame before the socket is closed.
    #[serde(default = "default_pong_timeout")]
    pub pong_timeout_seconds: u64,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            outbound_buffer: default_outbound_buffer(),
            ping_interval_seconds: default_ping_interval(),
            pong_timeout_seconds: default_pong_timeout(),
        }
    }
}

fn default_outbound_buffer() -> usize {
    64
}

fn default_ping_interval() -> u64 {
    25
}

fn default_pong_timeout() -> u64 {
    60
}
