//! Form priority and due-date windows.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Urgency of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "form_priority", rename_all = "snake_case")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Default.
    Medium,
    /// Needs attention soon.
    High,
    /// Needs attention now.
    Urgent,
}

/// Words in a title or description that escalate an unprioritized form.
const URGENT_KEYWORDS: [&str; 2] = ["urgent", "emergency"];

impl Priority {
    /// Resolve the priority of a new form.
    ///
    /// An explicit priority wins; otherwise an urgent keyword in the title or
    /// description makes the form `Urgent`; otherwise `Medium`.
    pub fn resolve(explicit: Option<Priority>, title: &str, description: &str) -> Priority {
        if let Some(priority) = explicit {
            return priority;
        }
        let title = title.to_lowercase();
        let description = description.to_lowercase();
        let urgent = URGENT_KEYWORDS
            .iter()
            .any(|kw| title.contains(kw) || description.contains(kw));
        if urgent {
            Priority::Urgent
        } else {
            Priority::Medium
        }
    }

    /// Hours between submission and the due date.
    pub fn window_hours(&self) -> i64 {
        match self {
            Self::Urgent => 24,
            Self::High => 48,
            Self::Medium => 72,
            Self::Low => 120,
        }
    }

    /// Return the priority as its display label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_priority_wins() {
        let p = Priority::resolve(Some(Priority::Low), "URGENT leak", "");
        assert_eq!(p, Priority::Low);
    }

    #[test]
    fn test_keyword_escalates() {
        assert_eq!(
            Priority::resolve(None, "Urgent: no hot water", ""),
            Priority::Urgent
        );
        assert_eq!(
            Priority::resolve(None, "Shower", "this is an emergency"),
            Priority::Urgent
        );
    }

    #[test]
    fn test_default_is_medium() {
        assert_eq!(
            Priority::resolve(None, "Weekly clean", "floor and desk"),
            Priority::Medium
        );
    }
}
