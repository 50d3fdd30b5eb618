//! Delivery counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Process-wide realtime counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    /// Connections ever registered
    pub connections_total: AtomicU64,
    /// Frames queued to a live connection
    pub frames_sent: AtomicU64,
    /// Frames dropped on a full or closed queue
    pub send_failures: AtomicU64,
    /// Notification pushes delivered live
    pub notifications_delivered: AtomicU64,
    /// Notification pushes skipped by the de-dup set
    pub notifications_deduplicated: AtomicU64,
    /// Notification pushes for accounts with no live connection
    pub notifications_offline: AtomicU64,
}

impl RealtimeMetrics {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn incr(counter: &AtomicU64, by: u64) {
        if by > 0 {
            counter.fetch_add(by, Ordering::Relaxed);
        }
    }
}

/// Serializable registry snapshot, reported by the health endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RealtimeStats {
    /// Live connections
    pub connections_active: u64,
    /// Connections ever registered
    pub connections_total: u64,
    /// Members per role group
    pub group_members: u64,
    /// Entries in the de-dup set across all accounts
    pub dedup_entries: u64,
    /// Frames queued
    pub frames_sent: u64,
    /// Frames dropped
    pub send_failures: u64,
    /// Notifications delivered live
    pub notifications_delivered: u64,
    /// Notifications skipped as duplicates
    pub notifications_deduplicated: u64,
    /// Notifications for offline accounts
    pub notifications_offline: u64,
}

impl RealtimeStats {
    pub(crate) fn from_counters(metrics: &RealtimeMetrics) -> Self {
        Self {
            connections_total: metrics.connections_total.load(Ordering::Relaxed),
            frames_sent: metrics.frames_sent.load(Ordering::Relaxed),
            send_failures: metrics.send_failures.load(Ordering::Relaxed),
            notifications_delivered: metrics.notifications_delivered.load(Ordering::Relaxed),
            notifications_deduplicated: metrics
                .notifications_deduplicated
                .load(Ordering::Relaxed),
            notifications_offline: metrics.notifications_offline.load(Ordering::Relaxed),
            ..Self::default()
        }
    }
}
