//! Individual WebSocket connection handle.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use dormhub_entity::account::Role;

use crate::message::types::OutboundEvent;

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// Result of handing a frame to a connection's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Queued for the writer task.
    Queued,
    /// The bounded queue is full; the frame was dropped.
    Full,
    /// The writer task is gone; the connection is dead.
    Closed,
}

/// A handle to a single WebSocket connection.
///
/// Holds the sender side of the connection's bounded outbound queue plus
/// the authenticated account it belongs to.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Account that owns this connection
    pub user_id: Uuid,
    /// Account role
    pub role: Role,
    /// Sender for serialized outbound frames
    sender: mpsc::Sender<String>,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    /// Last inbound frame, as a unix timestamp in milliseconds
    last_seen_ms: AtomicI64,
    /// Whether the connection is still alive
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Create a new connection handle
    pub fn new(user_id: Uuid, role: Role, sender: mpsc::Sender<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            role,
            sender,
            connected_at: now,
            last_seen_ms: AtomicI64::new(now.timestamp_millis()),
            alive: AtomicBool::new(true),
        }
    }

    /// Create a handle together with its outbound queue receiver.
    pub fn channel(user_id: Uuid, role: Role, buffer: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(user_id, role, tx), rx)
    }

    /// Queue a raw text frame without waiting.
    pub fn send_text(&self, frame: String) -> SendOutcome {
        if !self.is_alive() {
            return SendOutcome::Closed;
        }
        match self.sender.try_send(frame) {
            Ok(()) => SendOutcome::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(conn_id = %self.id, user_id = %self.user_id, "Send buffer full, dropping frame");
                SendOutcome::Full
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                SendOutcome::Closed
            }
        }
    }

    /// Serialize and queue an event.
    pub fn send(&self, event: &OutboundEvent) -> SendOutcome {
        match serde_json::to_string(event) {
            Ok(frame) => self.send_text(frame),
            Err(e) => {
                tracing::error!(conn_id = %self.id, error = %e, "Failed to serialize outbound event");
                SendOutcome::Closed
            }
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark connection as dead
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Record inbound activity (any frame counts as a pong).
    pub fn touch(&self) {
        self.last_seen_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    /// Milliseconds since the last inbound frame.
    pub fn idle_millis(&self) -> i64 {
        Utc::now().timestamp_millis() - self.last_seen_ms.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_queues_serialized_event() {
        let (handle, mut rx) = ConnectionHandle::channel(Uuid::new_v4(), Role::Student, 4);
        let outcome = handle.send(&OutboundEvent::Pong { timestamp: 7 });
        assert_eq!(outcome, SendOutcome::Queued);
        let frame = rx.recv().await.unwrap();
        assert_eq!(frame, r#"{"event":"pong","data":{"timestamp":7}}"#);
    }

    #[tokio::test]
    async fn test_full_queue_drops() {
        let (handle, _rx) = ConnectionHandle::channel(Uuid::new_v4(), Role::Admin, 1);
        assert_eq!(handle.send_text("a".into()), SendOutcome::Queued);
        assert_eq!(handle.send_text("b".into()), SendOutcome::Full);
        assert!(handle.is_alive());
    }

    #[tokio::test]
    async fn test_closed_receiver_marks_dead() {
        let (handle, rx) = ConnectionHandle::channel(Uuid::new_v4(), Role::Staff, 1);
        drop(rx);
        assert_eq!(handle.send_text("a".into()), SendOutcome::Closed);
        assert!(!handle.is_alive());
    }
}
