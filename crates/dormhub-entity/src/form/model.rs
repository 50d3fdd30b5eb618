//! Form entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use dormhub_core::{AppError, AppResult};

use super::priority::Priority;
use super::status::FormStatus;
use crate::account::{Actor, StaffType};

/// Kind of service request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "form_type", rename_all = "snake_case")]
pub enum FormType {
    /// Room cleaning.
    Cleaning,
    /// Routine maintenance.
    Maintenance,
    /// Repair of something broken.
    Repair,
}

impl FormType {
    /// The staff trade that handles this kind of form.
    pub fn required_staff_type(&self) -> StaffType {
        match self {
            Self::Cleaning => StaffType::Cleaner,
            Self::Maintenance | Self::Repair => StaffType::Maintenance,
        }
    }

    /// Upper bound on the due-date window, if the type imposes one.
    pub fn max_window_hours(&self) -> Option<i64> {
        match self {
            Self::Cleaning => Some(48),
            Self::Maintenance | Self::Repair => None,
        }
    }

    /// Return the type as its display label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cleaning => "Cleaning",
            Self::Maintenance => "Maintenance",
            Self::Repair => "Repair",
        }
    }
}

impl fmt::Display for FormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FormType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cleaning" => Ok(Self::Cleaning),
            "maintenance" => Ok(Self::Maintenance),
            "repair" => Ok(Self::Repair),
            _ => Err(AppError::validation(format!(
                "Invalid form type: '{s}'. Expected one of: Cleaning, Maintenance, Repair"
            ))),
        }
    }
}

/// A start/end time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// Window start.
    pub start: Option<DateTime<Utc>>,
    /// Window end.
    pub end: Option<DateTime<Utc>>,
}

impl Timing {
    /// Reject windows that end before they start.
    pub fn validate(&self) -> AppResult<()> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                return Err(AppError::validation(
                    "Preferred timing must end after it starts",
                ));
            }
        }
        Ok(())
    }
}

/// One entry of a form's audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    /// Status entered.
    pub status: FormStatus,
    /// When the status was entered.
    pub timestamp: DateTime<Utc>,
    /// Who changed it.
    pub updated_by: Actor,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// Student review of completed work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// Rating from 1 to 5.
    pub rating: u8,
    /// Optional comment.
    pub comment: Option<String>,
    /// When the review was left.
    pub submitted_at: DateTime<Utc>,
}

/// A student-submitted service request.
///
/// `status_history` only grows and its last entry always carries the
/// current `status`. `due_date` is fixed at submission.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Form {
    /// Unique identifier.
    pub id: Uuid,
    /// Submitting student.
    pub student_id: Uuid,
    /// Short title.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// Kind of request.
    pub form_type: FormType,
    /// When the student would like the work done.
    #[sqlx(json)]
    pub preferred_timing: Timing,
    /// When the work actually happened.
    #[sqlx(json)]
    pub actual_timing: Timing,
    /// Urgency.
    pub priority: Priority,
    /// Staff member doing the work.
    pub assigned_staff_id: Option<Uuid>,
    /// Current status.
    pub status: FormStatus,
    /// Append-only audit trail.
    #[sqlx(json)]
    pub status_history: Vec<StatusHistoryEntry>,
    /// Stored attachment paths.
    pub attachments: Vec<String>,
    /// Review left after completion.
    #[sqlx(json)]
    pub feedback: Option<Feedback>,
    /// Status of the form this one was rescheduled from.
    pub previous_status: Option<FormStatus>,
    /// Deadline derived from priority and type at submission.
    pub due_date: DateTime<Utc>,
    /// When the overdue notice went out, if it did.
    pub overdue_notified_at: Option<DateTime<Utc>>,
    /// When the form was created.
    pub created_at: DateTime<Utc>,
    /// When the form was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to submit a form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewForm {
    /// Short title.
    pub title: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Kind of request.
    pub form_type: FormType,
    /// Preferred window.
    #[serde(default)]
    pub preferred_timing: Timing,
    /// Explicit priority; resolved from the text when absent.
    pub priority: Option<Priority>,
    /// Already-stored attachment paths.
    #[serde(default)]
    pub attachments: Vec<String>,
}

/// Compute a form's due date.
///
/// The priority window is clamped by the type's maximum window.
pub fn due_date_for(
    priority: Priority,
    form_type: FormType,
    submitted_at: DateTime<Utc>,
) -> DateTime<Utc> {
    let mut hours = priority.window_hours();
    if let Some(max) = form_type.max_window_hours() {
        hours = hours.min(max);
    }
    submitted_at + Duration::hours(hours)
}

impl Form {
    /// Build a freshly submitted form with its initial history entry.
    pub fn submit(
        student_id: Uuid,
        input: NewForm,
        submitted_by: Actor,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        if input.title.trim().is_empty() {
            return Err(AppError::validation("Form title must not be empty"));
        }
        input.preferred_timing.validate()?;

        let priority = Priority::resolve(input.priority, &input.title, &input.description);
        let due_date = due_date_for(priority, input.form_type, now);

        Ok(Self {
            id: Uuid::new_v4(),
            student_id,
            title: input.title,
            description: input.description,
            form_type: input.form_type,
            preferred_timing: input.preferred_timing,
            actual_timing: Timing::default(),
            priority,
            assigned_staff_id: None,
            status: FormStatus::Submitted,
            status_history: vec![StatusHistoryEntry {
                status: FormStatus::Submitted,
                timestamp: now,
                updated_by: submitted_by,
                notes: Some("Form submitted".to_string()),
            }],
            attachments: input.attachments,
            feedback: None,
            previous_status: None,
            due_date,
            overdue_notified_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Build the replacement form for a reschedule.
    ///
    /// The new form starts over as `Submitted`, carries the original's
    /// content, and records where it came from in `previous_status` and a
    /// leading `Rescheduled` history entry.
    pub fn rescheduled_from(
        original: &Form,
        preferred_timing: Timing,
        actor: Actor,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        preferred_timing.validate()?;
        let due_date = due_date_for(original.priority, original.form_type, now);

        Ok(Self {
            id: Uuid::new_v4(),
            student_id: original.student_id,
            title: original.title.clone(),
            description: original.description.clone(),
            form_type: original.form_type,
            preferred_timing,
            actual_timing: Timing::default(),
            priority: original.priority,
            assigned_staff_id: None,
            status: FormStatus::Submitted,
            status_history: vec![
                StatusHistoryEntry {
                    status: FormStatus::Rescheduled,
                    timestamp: now,
                    updated_by: actor,
                    notes: Some(format!(
                        "Rescheduled from form {} (was {})",
                        original.id, original.status
                    )),
                },
                StatusHistoryEntry {
                    status: FormStatus::Submitted,
                    timestamp: now,
                    updated_by: actor,
                    notes: Some("Form resubmitted".to_string()),
                },
            ],
            attachments: original.attachments.clone(),
            feedback: None,
            previous_status: Some(original.status),
            due_date,
            overdue_notified_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Move to `status`, appending exactly one history entry.
    pub fn push_status(
        &mut self,
        status: FormStatus,
        actor: Actor,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) {
        self.status = status;
        self.status_history.push(StatusHistoryEntry {
            status,
            timestamp: now,
            updated_by: actor,
            notes,
        });
        self.updated_at = now;
    }

    /// Whether the last history entry carries the current status.
    pub fn history_is_consistent(&self) -> bool {
        self.status_history
            .last()
            .map(|entry| entry.status == self.status)
            .unwrap_or(false)
    }

    /// Whether the form is past its due date and still open.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open() && now > self.due_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Role;

    fn student() -> Actor {
        Actor::new(Uuid::new_v4(), Role::Student)
    }

    fn cleaning(title: &str) -> NewForm {
        NewForm {
            title: title.to_string(),
            description: "Please clean the bathroom".to_string(),
            form_type: FormType::Cleaning,
            preferred_timing: Timing::default(),
            priority: None,
            attachments: vec![],
        }
    }

    #[test]
    fn test_cleaning_form_due_in_48_hours() {
        let actor = student();
        let now = Utc::now();
        let form = Form::submit(actor.id, cleaning("Bathroom"), actor, now).unwrap();
        assert_eq!(form.priority, Priority::Medium);
        assert_eq!(form.due_date, now + Duration::hours(48));
    }

    #[test]
    fn test_repair_form_uses_priority_window() {
        let actor = student();
        let now = Utc::now();
        let mut input = cleaning("Broken lamp");
        input.form_type = FormType::Repair;
        let form = Form::submit(actor.id, input, actor, now).unwrap();
        assert_eq!(form.due_date, now + Duration::hours(72));

        let mut input = cleaning("Broken lamp");
        input.form_type = FormType::Repair;
        input.priority = Some(Priority::Low);
        let form = Form::submit(actor.id, input, actor, now).unwrap();
        assert_eq!(form.due_date, now + Duration::hours(120));
    }

    #[test]
    fn test_urgent_title_shortens_window() {
        let actor = student();
        let now = Utc::now();
        let form = Form::submit(actor.id, cleaning("URGENT spill"), actor, now).unwrap();
        assert_eq!(form.priority, Priority::Urgent);
        assert_eq!(form.due_date, now + Duration::hours(24));
    }

    #[test]
    fn test_submission_starts_history() {
        let actor = student();
        let form = Form::submit(actor.id, cleaning("Desk"), actor, Utc::now()).unwrap();
        assert_eq!(form.status, FormStatus::Submitted);
        assert_eq!(form.status_history.len(), 1);
        assert!(form.history_is_consistent());
    }

    #[test]
    fn test_blank_title_rejected() {
        let actor = student();
        assert!(Form::submit(actor.id, cleaning("   "), actor, Utc::now()).is_err());
    }

    #[test]
    fn test_inverted_timing_rejected() {
        let actor = student();
        let now = Utc::now();
        let mut input = cleaning("Desk");
        input.preferred_timing = Timing {
            start: Some(now),
            end: Some(now - Duration::hours(1)),
        };
        assert!(Form::submit(actor.id, input, actor, now).is_err());
    }

    #[test]
    fn test_push_status_appends_one_entry() {
        let actor = student();
        let now = Utc::now();
        let mut form = Form::submit(actor.id, cleaning("Desk"), actor, now).unwrap();
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        form.push_status(FormStatus::Approved, admin, None, now);
        assert_eq!(form.status_history.len(), 2);
        assert!(form.history_is_consistent());
    }

    #[test]
    fn test_rescheduled_form_carries_content() {
        let actor = student();
        let now = Utc::now();
        let mut input = cleaning("Desk");
        input.attachments = vec!["forms/a.jpg".to_string()];
        let mut original = Form::submit(actor.id, input, actor, now).unwrap();
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        original.push_status(FormStatus::Approved, admin, None, now);

        let later = now + Duration::hours(5);
        let copy = Form::rescheduled_from(&original, Timing::default(), actor, later).unwrap();
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.status, FormStatus::Submitted);
        assert_eq!(copy.previous_status, Some(FormStatus::Approved));
        assert_eq!(copy.attachments, original.attachments);
        assert_eq!(copy.status_history[0].status, FormStatus::Rescheduled);
        assert!(copy.history_is_consistent());
        assert_eq!(copy.due_date, later + Duration::hours(48));
    }

    #[test]
    fn test_overdue_only_while_open() {
        let actor = student();
        let now = Utc::now();
        let mut form = Form::submit(actor.id, cleaning("Desk"), actor, now).unwrap();
        let later = now + Duration::hours(49);
        assert!(form.is_overdue(later));
        form.push_status(FormStatus::Rejected, actor, None, now);
        assert!(!form.is_overdue(later));
    }
}
