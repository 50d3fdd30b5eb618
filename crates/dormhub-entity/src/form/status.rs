//! Form status enumeration and the admin transition table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use dormhub_core::AppError;

/// Lifecycle status of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "form_status", rename_all = "snake_case")]
pub enum FormStatus {
    /// Newly submitted; `Pending` is accepted as a legacy alias.
    #[serde(alias = "Pending")]
    Submitted,
    /// Approved by an admin, awaiting assignment.
    Approved,
    /// Rejected by an admin. Terminal.
    Rejected,
    /// Marker recorded in the history of a form created by rescheduling.
    Rescheduled,
    /// Assigned to a staff member.
    Assigned,
    /// Staff member has started work.
    #[serde(rename = "In Progress", alias = "InProgress")]
    InProgress,
    /// Work finished. Terminal.
    Completed,
}

const ALL: [FormStatus; 7] = [
    FormStatus::Submitted,
    FormStatus::Approved,
    FormStatus::Rejected,
    FormStatus::Rescheduled,
    FormStatus::Assigned,
    FormStatus::InProgress,
    FormStatus::Completed,
];

impl FormStatus {
    /// Every status, in lifecycle order.
    pub fn all() -> &'static [FormStatus] {
        &ALL
    }

    /// Return the status as its display label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Rescheduled => "Rescheduled",
            Self::Assigned => "Assigned",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }

    /// No transitions leave a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Completed)
    }

    /// Statuses only the assigned staff member may move a form into.
    pub fn is_staff_only(&self) -> bool {
        matches!(self, Self::InProgress | Self::Completed)
    }

    /// Targets an admin may move a form to from this status.
    pub fn admin_targets(&self) -> &'static [FormStatus] {
        match self {
            Self::Submitted | Self::Rescheduled => &[Self::Approved, Self::Rejected],
            Self::Approved => &[Self::Assigned, Self::Rejected],
            Self::Assigned => &[Self::Rejected],
            Self::Rejected | Self::InProgress | Self::Completed => &[],
        }
    }

    /// Whether an admin may move a form from this status to `target`.
    pub fn admin_can_transition_to(&self, target: FormStatus) -> bool {
        self.admin_targets().contains(&target)
    }

    /// Statuses from which staff can be assigned (`Pending` is `Submitted`).
    pub fn accepts_assignment(&self) -> bool {
        matches!(self, Self::Approved | Self::Submitted)
    }

    /// Statuses from which a student may reschedule.
    pub fn can_reschedule(&self) -> bool {
        matches!(
            self,
            Self::Submitted | Self::Approved | Self::Rejected | Self::Rescheduled
        )
    }

    /// Statuses still waiting on work, checked by the overdue sweep.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            Self::Submitted | Self::Rescheduled | Self::Approved | Self::Assigned | Self::InProgress
        )
    }
}

/// Render a status set as `"A, B"` for error messages.
pub fn describe(statuses: &[FormStatus]) -> String {
    if statuses.is_empty() {
        return "none".to_string();
    }
    statuses
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for FormStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FormStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "submitted" | "pending" => Ok(Self::Submitted),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "rescheduled" => Ok(Self::Rescheduled),
            "assigned" => Ok(Self::Assigned),
            "inprogress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => Err(AppError::validation(format!(
                "Invalid form status: '{s}'. Expected one of: {}",
                describe(&ALL)
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_table() {
        use FormStatus::*;
        assert!(Submitted.admin_can_transition_to(Approved));
        assert!(Submitted.admin_can_transition_to(Rejected));
        assert!(!Submitted.admin_can_transition_to(Completed));
        assert!(!Submitted.admin_can_transition_to(Assigned));
        assert!(Approved.admin_can_transition_to(Assigned));
        assert!(Assigned.admin_can_transition_to(Rejected));
        assert!(InProgress.admin_targets().is_empty());
        assert!(Completed.admin_targets().is_empty());
        assert!(Rejected.admin_targets().is_empty());
    }

    #[test]
    fn test_terminal_states_have_no_targets() {
        for status in FormStatus::all() {
            if status.is_terminal() {
                assert!(status.admin_targets().is_empty());
            }
        }
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!(
            "In Progress".parse::<FormStatus>().unwrap(),
            FormStatus::InProgress
        );
        assert_eq!(
            "in_progress".parse::<FormStatus>().unwrap(),
            FormStatus::InProgress
        );
        assert_eq!(
            "Pending".parse::<FormStatus>().unwrap(),
            FormStatus::Submitted
        );
        let err = "Done".parse::<FormStatus>().unwrap_err();
        assert!(err.message.contains("In Progress"));
    }

    #[test]
    fn test_serde_labels() {
        assert_eq!(
            serde_json::to_string(&FormStatus::InProgress).unwrap(),
            "\"In Progress\""
        );
        let legacy: FormStatus = serde_json::from_str("\"Pending\"").unwrap();
        assert_eq!(legacy, FormStatus::Submitted);
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            describe(FormStatus::Approved.admin_targets()),
            "Assigned, Rejected"
        );
        assert_eq!(describe(&[]), "none");
    }
}
