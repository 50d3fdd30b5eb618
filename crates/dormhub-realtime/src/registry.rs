//! Delivery registry: live connections, role groups and the notification
//! de-dup set.
//!
//! One live connection per account; the last `register` wins. The de-dup
//! set records every `(notification, account)` pair ever pushed so a
//! notification reaches each account at most once for the lifetime of the
//! process, across reconnects.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use dormhub_entity::account::Role;
use dormhub_entity::notification::{Notification, Recipient};

use crate::connection::handle::{ConnectionHandle, ConnectionId, SendOutcome};
use crate::message::types::{EmitTarget, OutboundEvent};
use crate::metrics::{RealtimeMetrics, RealtimeStats};

/// Outcome of a notification push.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PushReport {
    /// Accounts the event was queued to.
    pub delivered: usize,
    /// Accounts skipped because they already received it.
    pub deduplicated: usize,
    /// Accounts recorded but not reachable right now.
    pub offline: usize,
}

/// Tracks live connections and routes events to them.
#[derive(Debug, Default)]
pub struct DeliveryRegistry {
    /// Account → live connection.
    connections: DashMap<Uuid, Arc<ConnectionHandle>>,
    /// Role → member accounts.
    groups: DashMap<Role, HashSet<Uuid>>,
    /// Account → notification ids already pushed.
    dedup: DashMap<Uuid, HashSet<Uuid>>,
    /// Counters.
    metrics: RealtimeMetrics,
}

impl DeliveryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a connection to its account and role group.
    ///
    /// Returns the connection it replaced, if any. The replaced connection
    /// is left open; it simply stops receiving.
    pub fn register(&self, handle: Arc<ConnectionHandle>) -> Option<Arc<ConnectionHandle>> {
        let user_id = handle.user_id;
        let role = handle.role;
        let conn_id = handle.id;
        let previous = self.connections.insert(user_id, handle);
        self.groups.entry(role).or_default().insert(user_id);
        RealtimeMetrics::incr(&self.metrics.connections_total, 1);

        tracing::info!(
            user_id = %user_id,
            role = %role,
            conn_id = %conn_id,
            replaced = previous.is_some(),
            "Realtime connection registered"
        );
        previous
    }

    /// Remove the mapping for `user_id` if it still points at `conn_id`.
    ///
    /// A stale connection closing after a reconnect is a no-op. The de-dup
    /// set is never cleared.
    pub fn unregister(&self, user_id: Uuid, conn_id: ConnectionId) -> bool {
        let removed = self
            .connections
            .remove_if(&user_id, |_, handle| handle.id == conn_id)
            .is_some();
        if removed {
            for mut members in self.groups.iter_mut() {
                members.value_mut().remove(&user_id);
            }
            tracing::info!(user_id = %user_id, conn_id = %conn_id, "Realtime connection unregistered");
        } else {
            tracing::debug!(user_id = %user_id, conn_id = %conn_id, "Stale unregister ignored");
        }
        removed
    }

    /// Add a registered account to a role group.
    pub fn join_group(&self, user_id: Uuid, role: Role) -> bool {
        if !self.connections.contains_key(&user_id) {
            return false;
        }
        self.groups.entry(role).or_default().insert(user_id);
        true
    }

    /// Whether an account has a live connection.
    pub fn is_online(&self, user_id: Uuid) -> bool {
        self.connections
            .get(&user_id)
            .map(|h| h.is_alive())
            .unwrap_or(false)
    }

    /// Current members of a role group.
    pub fn group_members(&self, role: Role) -> Vec<Uuid> {
        self.groups
            .get(&role)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Push a stored notification to every account it addresses.
    ///
    /// Broadcasts resolve to the role group as it stands now. Never fails;
    /// send problems are logged and counted.
    pub fn push(&self, notification: &Notification) -> PushReport {
        let targets = match notification.recipient() {
            Recipient::SpecificUser { id, .. } => vec![id],
            Recipient::RoleBroadcast { model } => self.group_members(Role::from(model)),
        };

        let frame = match serde_json::to_string(&OutboundEvent::NewNotification(
            notification.clone(),
        )) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(notification_id = %notification.id, error = %e, "Failed to serialize notification");
                return PushReport::default();
            }
        };

        let mut report = PushReport::default();
        for target in targets {
            let fresh = self.dedup.entry(target).or_default().insert(notification.id);
            if !fresh {
                report.deduplicated += 1;
                continue;
            }
            if self.send_to(target, &frame) {
                report.delivered += 1;
            } else {
                report.offline += 1;
            }
        }

        RealtimeMetrics::incr(&self.metrics.notifications_delivered, report.delivered as u64);
        RealtimeMetrics::incr(
            &self.metrics.notifications_deduplicated,
            report.deduplicated as u64,
        );
        RealtimeMetrics::incr(&self.metrics.notifications_offline, report.offline as u64);
        tracing::debug!(
            notification_id = %notification.id,
            delivered = report.delivered,
            deduplicated = report.deduplicated,
            offline = report.offline,
            "Notification pushed"
        );
        report
    }

    /// Send a non-notification event to an account or role group.
    /// Returns how many connections it was queued to.
    pub fn emit(&self, target: EmitTarget, event: &OutboundEvent) -> usize {
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(event = event.name(), error = %e, "Failed to serialize event");
                return 0;
            }
        };
        let recipients = match target {
            EmitTarget::User(id) => vec![id],
            EmitTarget::Group(role) => self.group_members(role),
        };
        recipients
            .into_iter()
            .filter(|id| self.send_to(*id, &frame))
            .count()
    }

    /// Total `(notification, account)` pairs recorded.
    pub fn dedup_entries(&self) -> usize {
        self.dedup.iter().map(|entry| entry.value().len()).sum()
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Snapshot for the health endpoint.
    pub fn stats(&self) -> RealtimeStats {
        RealtimeStats {
            connections_active: self.connections.len() as u64,
            group_members: self.groups.iter().map(|g| g.value().len() as u64).sum(),
            dedup_entries: self.dedup_entries() as u64,
            ..RealtimeStats::from_counters(&self.metrics)
        }
    }

    fn send_to(&self, user_id: Uuid, frame: &str) -> bool {
        let Some(handle) = self.connections.get(&user_id).map(|h| Arc::clone(h.value())) else {
            return false;
        };
        match handle.send_text(frame.to_string()) {
            SendOutcome::Queued => {
                RealtimeMetrics::incr(&self.metrics.frames_sent, 1);
                true
            }
            SendOutcome::Full | SendOutcome::Closed => {
                RealtimeMetrics::incr(&self.metrics.send_failures, 1);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dormhub_entity::notification::{NewNotification, NotificationType};
    use tokio::sync::mpsc;

    fn connect(
        registry: &DeliveryRegistry,
        user_id: Uuid,
        role: Role,
    ) -> (Arc<ConnectionHandle>, mpsc::Receiver<String>) {
        let (handle, rx) = ConnectionHandle::channel(user_id, role, 16);
        let handle = Arc::new(handle);
        registry.register(handle.clone());
        (handle, rx)
    }

    fn notification(recipient: Recipient) -> Notification {
        NewNotification::new(
            recipient,
            NotificationType::FormStatusChanged,
            "Form updated",
            "Status changed from Submitted to Approved",
        )
        .into_notification(Utc::now())
    }

    #[tokio::test]
    async fn test_push_delivers_once() {
        let registry = DeliveryRegistry::new();
        let student = Uuid::new_v4();
        let (_handle, mut rx) = connect(&registry, student, Role::Student);

        let n = notification(Recipient::student(student));
        let first = registry.push(&n);
        assert_eq!(first.delivered, 1);
        let frame = rx.recv().await.unwrap();
        assert!(frame.starts_with(r#"{"event":"newNotification""#));

        let second = registry.push(&n);
        assert_eq!(second.deduplicated, 1);
        assert_eq!(second.delivered, 0);
        assert!(rx.try_recv().is_err());
        assert_eq!(registry.dedup_entries(), 1);
    }

    #[tokio::test]
    async fn test_offline_push_is_recorded_and_not_redelivered() {
        let registry = DeliveryRegistry::new();
        let student = Uuid::new_v4();
        let n = notification(Recipient::student(student));

        assert_eq!(registry.push(&n).offline, 1);

        let (_handle, mut rx) = connect(&registry, student, Role::Student);
        assert_eq!(registry.push(&n).deduplicated, 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_register_replaces_previous_connection() {
        let registry = DeliveryRegistry::new();
        let user = Uuid::new_v4();
        let (old, mut old_rx) = connect(&registry, user, Role::Staff);
        let (new, mut new_rx) = connect(&registry, user, Role::Staff);
        assert_ne!(old.id, new.id);
        assert_eq!(registry.connection_count(), 1);

        let sent = registry.emit(EmitTarget::User(user), &OutboundEvent::Pong { timestamp: 1 });
        assert_eq!(sent, 1);
        assert!(new_rx.recv().await.is_some());
        assert!(old_rx.try_recv().is_err());
        assert!(old.is_alive());
    }

    #[tokio::test]
    async fn test_stale_unregister_is_noop() {
        let registry = DeliveryRegistry::new();
        let user = Uuid::new_v4();
        let (old, _old_rx) = connect(&registry, user, Role::Student);
        let (new, _new_rx) = connect(&registry, user, Role::Student);

        assert!(!registry.unregister(user, old.id));
        assert!(registry.is_online(user));
        assert_eq!(registry.group_members(Role::Student), vec![user]);

        assert!(registry.unregister(user, new.id));
        assert!(!registry.is_online(user));
        assert!(registry.group_members(Role::Student).is_empty());
    }

    #[tokio::test]
    async fn test_unregister_keeps_dedup_set() {
        let registry = DeliveryRegistry::new();
        let user = Uuid::new_v4();
        let (handle, _rx) = connect(&registry, user, Role::Student);
        let n = notification(Recipient::student(user));
        registry.push(&n);
        registry.unregister(user, handle.id);
        assert_eq!(registry.dedup_entries(), 1);
    }

    #[tokio::test]
    async fn test_broadcast_resolves_group_at_push_time() {
        let registry = DeliveryRegistry::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let (_ha, mut rx_a) = connect(&registry, a, Role::Admin);
        let (_hs, mut rx_s) = connect(&registry, Uuid::new_v4(), Role::Student);

        let n = notification(Recipient::all_admins());
        let report = registry.push(&n);
        assert_eq!(report.delivered, 1);
        assert!(rx_a.recv().await.is_some());
        assert!(rx_s.try_recv().is_err());

        // A later admin is not retroactively reached by the earlier push,
        // but the same notification pushed again reaches only the newcomer.
        let (_hb, mut rx_b) = connect(&registry, b, Role::Admin);
        let again = registry.push(&n);
        assert_eq!(again.delivered, 1);
        assert_eq!(again.deduplicated, 1);
        assert!(rx_b.recv().await.is_some());
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_join_group_requires_registration() {
        let registry = DeliveryRegistry::new();
        let user = Uuid::new_v4();
        assert!(!registry.join_group(user, Role::Admin));
        let (_h, _rx) = connect(&registry, user, Role::Staff);
        assert!(registry.join_group(user, Role::Staff));
        assert_eq!(registry.group_members(Role::Staff), vec![user]);
    }

    #[tokio::test]
    async fn test_full_queue_counts_failure() {
        let registry = DeliveryRegistry::new();
        let user = Uuid::new_v4();
        let (handle, _rx) = ConnectionHandle::channel(user, Role::Student, 1);
        registry.register(Arc::new(handle));

        let pong = OutboundEvent::Pong { timestamp: 0 };
        assert_eq!(registry.emit(EmitTarget::User(user), &pong), 1);
        assert_eq!(registry.emit(EmitTarget::User(user), &pong), 0);

        let stats = registry.stats();
        assert_eq!(stats.frames_sent, 1);
        assert_eq!(stats.send_failures, 1);
        assert_eq!(stats.connections_active, 1);
    }
}
