//! Notification type and priority enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::recipient::RecipientModel;

/// Closed set of events that produce notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// A direct message arrived.
    NewMessage,
    /// A student submitted a form.
    FormSubmitted,
    /// A form changed status.
    FormStatusChanged,
    /// A form was assigned to a staff member.
    FormAssigned,
    /// A form passed its due date.
    FormOverdue,
    /// A bill was issued.
    BillCreated,
    /// A bill was fully paid.
    BillPaid,
    /// Payments on a bill were returned.
    BillReturned,
    /// A bill passed its due date.
    BillOverdue,
    /// A student checked in after curfew.
    LateCheckIn,
    /// A student checked out after curfew.
    LateCheckOut,
    /// News was published.
    NewsPublished,
    /// An offense was recorded.
    OffenseRecorded,
}

impl NotificationType {
    /// Recipient kinds this type may be addressed to.
    pub fn accepted_models(&self) -> &'static [RecipientModel] {
        use RecipientModel::*;
        match self {
            Self::NewMessage => &[User, Admin],
            Self::FormSubmitted => &[Admin],
            Self::FormStatusChanged => &[User, Staff, Admin],
            Self::FormAssigned => &[Staff],
            Self::FormOverdue => &[Admin, Staff],
            Self::BillCreated => &[User],
            Self::BillPaid => &[User, Admin],
            Self::BillReturned => &[User],
            Self::BillOverdue => &[User, Admin],
            Self::LateCheckIn | Self::LateCheckOut => &[Admin],
            Self::NewsPublished => &[User],
            Self::OffenseRecorded => &[User],
        }
    }

    /// Whether this type may be addressed to `model`.
    pub fn accepts(&self, model: RecipientModel) -> bool {
        self.accepted_models().contains(&model)
    }

    /// Default priority for the type.
    pub fn default_priority(&self) -> NotificationPriority {
        match self {
            Self::FormOverdue | Self::BillOverdue | Self::LateCheckIn | Self::LateCheckOut => {
                NotificationPriority::High
            }
            Self::NewsPublished => NotificationPriority::Low,
            _ => NotificationPriority::Normal,
        }
    }

    /// Return the type as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewMessage => "new_message",
            Self::FormSubmitted => "form_submitted",
            Self::FormStatusChanged => "form_status_changed",
            Self::FormAssigned => "form_assigned",
            Self::FormOverdue => "form_overdue",
            Self::BillCreated => "bill_created",
            Self::BillPaid => "bill_paid",
            Self::BillReturned => "bill_returned",
            Self::BillOverdue => "bill_overdue",
            Self::LateCheckIn => "late_check_in",
            Self::LateCheckOut => "late_check_out",
            Self::NewsPublished => "news_published",
            Self::OffenseRecorded => "offense_recorded",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Notification priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_priority", rename_all = "snake_case")]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    /// Informational.
    Low,
    /// Default.
    Normal,
    /// Needs attention.
    High,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_guards() {
        assert!(NotificationType::NewMessage.accepts(RecipientModel::User));
        assert!(!NotificationType::NewMessage.accepts(RecipientModel::Staff));
        assert!(NotificationType::FormAssigned.accepts(RecipientModel::Staff));
        assert!(!NotificationType::FormAssigned.accepts(RecipientModel::User));
        assert!(!NotificationType::LateCheckIn.accepts(RecipientModel::User));
    }

    #[test]
    fn test_every_type_accepts_someone() {
        let all = [
            NotificationType::NewMessage,
            NotificationType::FormSubmitted,
            NotificationType::FormStatusChanged,
            NotificationType::FormAssigned,
            NotificationType::FormOverdue,
            NotificationType::BillCreated,
            NotificationType::BillPaid,
            NotificationType::BillReturned,
            NotificationType::BillOverdue,
            NotificationType::LateCheckIn,
            NotificationType::LateCheckOut,
            NotificationType::NewsPublished,
            NotificationType::OffenseRecorded,
        ];
        for t in all {
            assert!(!t.accepted_models().is_empty(), "{t}");
        }
    }
}
