//! Ping/pong heartbeat for WebSocket keepalive.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time;

use dormhub_core::config::RealtimeConfig;

use super::handle::{ConnectionHandle, SendOutcome};
use crate::message::types::OutboundEvent;

/// Heartbeat configuration
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Interval between pings
    pub ping_interval: Duration,
    /// Silence after which the connection is considered dead
    pub pong_timeout: Duration,
}

impl HeartbeatConfig {
    /// Build from the realtime configuration section.
    pub fn from_config(config: &RealtimeConfig) -> Self {
        Self {
            ping_interval: Duration::from_secs(config.ping_interval_seconds.max(1)),
            pong_timeout: Duration::from_secs(config.pong_timeout_seconds.max(1)),
        }
    }
}

/// Run the heartbeat loop for a connection.
///
/// Sends a `ping` event every interval and marks the connection dead when
/// nothing has been received within the timeout. Returns once the
/// connection is dead; the caller closes the socket.
pub async fn run_heartbeat(handle: Arc<ConnectionHandle>, config: HeartbeatConfig) {
    let mut interval = time::interval(config.ping_interval);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;

        if !handle.is_alive() {
            break;
        }

        let idle = handle.idle_millis().max(0) as u128;
        if idle > config.pong_timeout.as_millis() {
            tracing::warn!(
                conn_id = %handle.id,
                user_id = %handle.user_id,
                idle_ms = idle as u64,
                "Connection heartbeat timeout"
            );
            handle.mark_dead();
            break;
        }

        let ping = OutboundEvent::Ping {
            timestamp: Utc::now().timestamp_millis(),
        };
        if handle.send(&ping) == SendOutcome::Closed {
            tracing::debug!(conn_id = %handle.id, "Ping send failed, marking dead");
            handle.mark_dead();
            break;
        }
    }

    tracing::debug!(conn_id = %handle.id, "Heartbeat loop ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use dormhub_entity::account::Role;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_heartbeat_pings_then_stops_when_receiver_dropped() {
        let (handle, mut rx) = ConnectionHandle::channel(Uuid::new_v4(), Role::Student, 8);
        let handle = Arc::new(handle);
        let config = HeartbeatConfig {
            ping_interval: Duration::from_millis(10),
            pong_timeout: Duration::from_secs(60),
        };
        let task = tokio::spawn(run_heartbeat(handle.clone(), config));

        let frame = rx.recv().await.unwrap();
        assert!(frame.contains(r#""event":"ping""#));

        drop(rx);
        task.await.unwrap();
        assert!(!handle.is_alive());
    }

    #[test]
    fn test_from_config() {
        let config = HeartbeatConfig::from_config(&RealtimeConfig::default());
        assert_eq!(config.ping_interval, Duration::from_secs(25));
        assert_eq!(config.pong_timeout, Duration::from_secs(60));
    }
}
