//! Pending side effects of domain actions.
//!
//! An action persists its primary change, then returns an [`Outcome`]
//! carrying the notifications and realtime events it implies. The
//! [`EffectExecutor`] runs them in order after the write has succeeded.
//! Effect failures are logged and counted; they never fail the action.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;

use dormhub_core::result::AppResult;
use dormhub_database::repositories::NotificationRepository;
use dormhub_entity::notification::{NewNotification, Notification};
use dormhub_realtime::{DeliveryRegistry, EmitTarget, OutboundEvent};

/// A deferred consequence of a domain action.
#[derive(Debug, Clone)]
pub enum SideEffect {
    /// Persist a notification and push it to its recipients.
    Notify(NewNotification),
    /// Send a realtime event without persisting anything.
    Emit {
        /// Who receives the event.
        target: EmitTarget,
        /// The event.
        event: OutboundEvent,
    },
}

impl SideEffect {
    /// Short description used in logs.
    pub fn describe(&self) -> String {
        match self {
            Self::Notify(n) => format!("notify {} {:?}", n.kind.as_str(), n.recipient),
            Self::Emit { target, event } => format!("emit {} to {:?}", event.name(), target),
        }
    }
}

/// The value produced by an action plus the effects it still owes.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    /// The persisted result.
    pub value: T,
    /// Effects to run after persistence.
    pub effects: Vec<SideEffect>,
}

impl<T> Outcome<T> {
    /// An outcome with no effects.
    pub fn new(value: T) -> Self {
        Self {
            value,
            effects: Vec::new(),
        }
    }

    /// Queue a notification.
    pub fn notify(mut self, notification: NewNotification) -> Self {
        self.effects.push(SideEffect::Notify(notification));
        self
    }

    /// Queue several notifications.
    pub fn notify_all(mut self, notifications: impl IntoIterator<Item = NewNotification>) -> Self {
        self.effects
            .extend(notifications.into_iter().map(SideEffect::Notify));
        self
    }

    /// Queue a realtime event.
    pub fn emit(mut self, target: EmitTarget, event: OutboundEvent) -> Self {
        self.effects.push(SideEffect::Emit { target, event });
        self
    }
}

/// Counts of what an effect run achieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EffectReport {
    /// Notifications stored.
    pub persisted: usize,
    /// Notifications skipped because the type does not accept the recipient.
    pub skipped: usize,
    /// Live deliveries (notifications and events).
    pub delivered: usize,
    /// Effects that failed.
    pub failed: usize,
}

/// Where notifications are persisted.
#[async_trait]
pub trait NotificationStore: Send + Sync + std::fmt::Debug {
    /// Store a notification and return the stored row.
    async fn store(&self, notification: &Notification) -> AppResult<Notification>;
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn store(&self, notification: &Notification) -> AppResult<Notification> {
        self.create(notification).await
    }
}

/// Runs pending side effects.
#[derive(Debug, Clone)]
pub struct EffectExecutor {
    /// Notification persistence.
    store: Arc<dyn NotificationStore>,
    /// Live delivery.
    registry: Arc<DeliveryRegistry>,
}

impl EffectExecutor {
    /// Creates a new executor.
    pub fn new(store: Arc<dyn NotificationStore>, registry: Arc<DeliveryRegistry>) -> Self {
        Self { store, registry }
    }

    /// The delivery registry effects are pushed through.
    pub fn registry(&self) -> &Arc<DeliveryRegistry> {
        &self.registry
    }

    /// Run an outcome's effects and hand back its value.
    pub async fn apply<T>(&self, outcome: Outcome<T>) -> T {
        self.run(outcome.effects).await;
        outcome.value
    }

    /// Run effects in order. Never fails.
    pub async fn run(&self, effects: Vec<SideEffect>) -> EffectReport {
        let mut report = EffectReport::default();

        for effect in effects {
            match effect {
                SideEffect::Notify(new) => {
                    if !new.is_deliverable() {
                        tracing::debug!(
                            kind = new.kind.as_str(),
                            model = %new.recipient.model(),
                            "Notification type does not accept recipient, skipping"
                        );
                        report.skipped += 1;
                        continue;
                    }
                    let description = SideEffect::Notify(new.clone()).describe();
                    let notification = new.into_notification(Utc::now());
                    match self.store.store(&notification).await {
                        Ok(stored) => {
                            report.persisted += 1;
                            report.delivered += self.registry.push(&stored).delivered;
                        }
                        Err(e) => {
                            tracing::warn!(effect = %description, error = %e, "Failed to persist notification");
                            report.failed += 1;
                        }
                    }
                }
                SideEffect::Emit { target, event } => {
                    report.delivered += self.registry.emit(target, &event);
                }
            }
        }

        if report.failed > 0 {
            tracing::warn!(?report, "Some side effects failed");
        }
        report
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use dormhub_core::AppError;

    use super::*;

    /// In-memory notification store for tests.
    #[derive(Debug, Default)]
    pub struct MemoryStore {
        pub stored: Mutex<Vec<Notification>>,
        pub fail: bool,
    }

    #[async_trait]
    impl NotificationStore for MemoryStore {
        async fn store(&self, notification: &Notification) -> AppResult<Notification> {
            if self.fail {
                return Err(AppError::database("connection refused"));
            }
            self.stored.lock().unwrap().push(notification.clone());
            Ok(notification.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemoryStore;
    use super::*;
    use dormhub_entity::account::Role;
    use dormhub_entity::notification::{NotificationType, Recipient};
    use dormhub_realtime::ConnectionHandle;
    use uuid::Uuid;

    fn executor(store: Arc<MemoryStore>) -> (EffectExecutor, Arc<DeliveryRegistry>) {
        let registry = Arc::new(DeliveryRegistry::new());
        (EffectExecutor::new(store, registry.clone()), registry)
    }

    #[tokio::test]
    async fn test_run_persists_and_pushes() {
        let store = Arc::new(MemoryStore::default());
        let (exec, registry) = executor(store.clone());
        let student = Uuid::new_v4();
        let (handle, mut rx) = ConnectionHandle::channel(student, Role::Student, 8);
        registry.register(Arc::new(handle));

        let outcome = Outcome::new(42)
            .notify(NewNotification::new(
                Recipient::student(student),
                NotificationType::BillCreated,
                "New bill",
                "A bill was issued",
            ))
            .emit(EmitTarget::User(student), OutboundEvent::Pong { timestamp: 1 });
        let effects = outcome.effects.clone();
        let report = exec.run(effects).await;

        assert_eq!(report.persisted, 1);
        assert_eq!(report.delivered, 2);
        assert_eq!(store.stored.lock().unwrap().len(), 1);
        assert!(rx.recv().await.unwrap().contains("newNotification"));
        assert!(rx.recv().await.unwrap().contains("pong"));
        assert_eq!(exec.apply(outcome).await, 42);
    }

    #[tokio::test]
    async fn test_undeliverable_type_is_skipped() {
        let store = Arc::new(MemoryStore::default());
        let (exec, _) = executor(store.clone());
        // Bill creation is only ever addressed to students.
        let report = exec
            .run(vec![SideEffect::Notify(NewNotification::new(
                Recipient::all_admins(),
                NotificationType::BillCreated,
                "New bill",
                "",
            ))])
            .await;
        assert_eq!(report.skipped, 1);
        assert!(store.stored.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_does_not_propagate() {
        let store = Arc::new(MemoryStore {
            fail: true,
            ..MemoryStore::default()
        });
        let (exec, _) = executor(store);
        let value = exec
            .apply(Outcome::new("ok").notify(NewNotification::new(
                Recipient::student(Uuid::new_v4()),
                NotificationType::OffenseRecorded,
                "Offense recorded",
                "",
            )))
            .await;
        assert_eq!(value, "ok");
    }
}
