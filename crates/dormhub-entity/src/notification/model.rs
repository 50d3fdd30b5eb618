//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::{NotificationPriority, NotificationType};
use super::recipient::{Recipient, RecipientModel};

/// The entity a notification is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedTo {
    /// Entity kind, e.g. `"Form"`.
    pub model: String,
    /// Entity id.
    pub id: Uuid,
}

impl RelatedTo {
    /// Reference an entity.
    pub fn new(model: &str, id: Uuid) -> Self {
        Self {
            model: model.to_string(),
            id,
        }
    }
}

/// A persisted notification. Immutable after creation except `is_read`.
///
/// The recipient is stored as `(recipient_model, recipient_id)` where a
/// missing id addresses every account of the model; use
/// [`Notification::recipient`] for the typed form.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: Uuid,
    /// Addressed account kind.
    pub recipient_model: RecipientModel,
    /// Addressed account, absent for role broadcasts.
    pub recipient_id: Option<Uuid>,
    /// Event type.
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: NotificationType,
    /// Title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Priority.
    pub priority: NotificationPriority,
    /// Whether the recipient has read it.
    pub is_read: bool,
    /// Related entity kind.
    pub related_model: Option<String>,
    /// Related entity id.
    pub related_id: Option<Uuid>,
    /// Free-form structured data.
    pub metadata: serde_json::Value,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// The typed recipient.
    pub fn recipient(&self) -> Recipient {
        Recipient::from_columns(self.recipient_model, self.recipient_id)
    }

    /// The related entity, when both columns are set.
    pub fn related_to(&self) -> Option<RelatedTo> {
        match (&self.related_model, self.related_id) {
            (Some(model), Some(id)) => Some(RelatedTo {
                model: model.clone(),
                id,
            }),
            _ => None,
        }
    }
}

/// Data required to create a notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    /// Who it is for.
    pub recipient: Recipient,
    /// Event type.
    pub kind: NotificationType,
    /// Title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Priority.
    pub priority: NotificationPriority,
    /// Related entity.
    pub related_to: Option<RelatedTo>,
    /// Free-form structured data.
    pub metadata: serde_json::Value,
}

impl NewNotification {
    /// Start a notification with the type's default priority.
    pub fn new(
        recipient: Recipient,
        kind: NotificationType,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            recipient,
            kind,
            title: title.into(),
            content: content.into(),
            priority: kind.default_priority(),
            related_to: None,
            metadata: serde_json::Value::Object(Default::default()),
        }
    }

    /// Attach the related entity.
    pub fn related(mut self, model: &str, id: Uuid) -> Self {
        self.related_to = Some(RelatedTo::new(model, id));
        self
    }

    /// Attach structured metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether the type accepts this recipient's model.
    pub fn is_deliverable(&self) -> bool {
        self.kind.accepts(self.recipient.model())
    }

    /// Materialize into a row with a fresh id.
    pub fn into_notification(self, now: DateTime<Utc>) -> Notification {
        let (related_model, related_id) = match self.related_to {
            Some(r) => (Some(r.model), Some(r.id)),
            None => (None, None),
        };
        Notification {
            id: Uuid::new_v4(),
            recipient_model: self.recipient.model(),
            recipient_id: self.recipient.id(),
            kind: self.kind,
            title: self.title,
            content: self.content,
            priority: self.priority,
            is_read: false,
            related_model,
            related_id,
            metadata: self.metadata,
            created_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialize_keeps_recipient() {
        let student = Uuid::new_v4();
        let form = Uuid::new_v4();
        let n = NewNotification::new(
            Recipient::student(student),
            NotificationType::FormStatusChanged,
            "Form approved",
            "Your form was approved",
        )
        .related("Form", form)
        .into_notification(Utc::now());

        assert_eq!(n.recipient(), Recipient::student(student));
        assert_eq!(n.related_to(), Some(RelatedTo::new("Form", form)));
        assert!(!n.is_read);
    }

    #[test]
    fn test_deliverable_follows_type_guard() {
        let n = NewNotification::new(
            Recipient::student(Uuid::new_v4()),
            NotificationType::LateCheckIn,
            "Late",
            "Late check-in",
        );
        assert!(!n.is_deliverable());
        let n = NewNotification::new(
            Recipient::all_admins(),
            NotificationType::LateCheckIn,
            "Late",
            "Late check-in",
        );
        assert!(n.is_deliverable());
    }

    #[test]
    fn test_type_serialized_as_type() {
        let n = NewNotification::new(
            Recipient::all_admins(),
            NotificationType::FormSubmitted,
            "t",
            "c",
        )
        .into_notification(Utc::now());
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "form_submitted");
    }
}
