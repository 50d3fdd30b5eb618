//! Request DTOs with validation.

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use dormhub_database::repositories::{FormFilter, StaffFilter};
use dormhub_entity::account::{StaffStatus, StaffType};
use dormhub_entity::bill::BillStatus;
use dormhub_entity::building::RoomStatus;
use dormhub_entity::form::{FormStatus, FormType, Timing};
use dormhub_service::billing::PaymentRequest;
use dormhub_service::form::service::ReviewRequest;

/// Login request body.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    /// Account email.
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Password change request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    /// Current password.
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    /// New password. Strength is checked by the service.
    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// Staff availability change.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailabilityRequest {
    /// New availability.
    pub status: StaffStatus,
}

/// Admin status change for a form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct FormStatusRequest {
    /// Target status.
    pub status: FormStatus,
    /// Staff member, required when the target is `Assigned`.
    pub assigned_staff_id: Option<Uuid>,
    /// Notes recorded in the history entry.
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Assign a staff member to a form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AssignRequest {
    /// Staff member.
    pub staff_id: Uuid,
    /// Notes recorded in the history entry.
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

/// Staff completion notes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompleteRequest {
    /// Notes forwarded to the student.
    pub notes: Option<String>,
}

/// Student review of completed work.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewDto {
    /// Rating from 1 to 5.
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: u8,
    /// Optional comment.
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

impl From<ReviewDto> for ReviewRequest {
    fn from(dto: ReviewDto) -> Self {
        Self {
            rating: dto.rating,
            comment: dto.comment,
        }
    }
}

/// New preferred time window for a form.
#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleRequest {
    /// Requested window.
    pub preferred_timing: Timing,
}

/// Payment against a bill.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentDto {
    /// Amount in minor currency units.
    #[validate(range(
        min = 1i64,
        max = 1_000_000_000_000i64,
        message = "Payment amount must be between 1 and 1000000000000"
    ))]
    pub amount: i64,
    /// Payment method.
    #[validate(length(min = 1, max = 50, message = "Payment method is required"))]
    pub method: String,
    /// External transaction reference.
    #[validate(length(max = 200))]
    pub transaction_id: Option<String>,
    /// Free-text notes.
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl From<PaymentDto> for PaymentRequest {
    fn from(dto: PaymentDto) -> Self {
        Self {
            amount: dto.amount,
            method: dto.method,
            transaction_id: dto.transaction_id,
            notes: dto.notes,
        }
    }
}

/// Admin status override for a bill.
#[derive(Debug, Clone, Deserialize)]
pub struct BillStatusRequest {
    /// Target status.
    pub status: BillStatus,
    /// Notes kept on the bill.
    pub notes: Option<String>,
}

/// Return a bill's payments to the student.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReturnBillRequest {
    /// Reason shown to the student.
    pub reason: Option<String>,
}

/// New curfew time.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CurfewRequest {
    /// Local time, `HH:MM`.
    #[validate(length(min = 4, max = 5, message = "Time must be HH:MM"))]
    pub time: String,
}

/// Place a student in a room.
#[derive(Debug, Clone, Deserialize)]
pub struct OccupantRequest {
    /// Student to place.
    pub student_id: Uuid,
}

/// Form list filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormQuery {
    /// Submitting student (admin only).
    pub student_id: Option<Uuid>,
    /// Assigned staff member (admin only).
    pub staff_id: Option<Uuid>,
    /// Status.
    pub status: Option<FormStatus>,
    /// Request type.
    pub form_type: Option<FormType>,
}

impl From<FormQuery> for FormFilter {
    fn from(q: FormQuery) -> Self {
        Self {
            student_id: q.student_id,
            staff_id: q.staff_id,
            status: q.status,
            form_type: q.form_type,
        }
    }
}

/// Staff list filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaffQuery {
    /// Trade.
    pub type_of_staff: Option<StaffType>,
    /// Availability.
    pub status: Option<StaffStatus>,
}

impl From<StaffQuery> for StaffFilter {
    fn from(q: StaffQuery) -> Self {
        Self {
            type_of_staff: q.type_of_staff,
            status: q.status,
        }
    }
}

/// Student list search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentQuery {
    /// Matches name, email or student number.
    pub search: Option<String>,
}

/// Bill list filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BillQuery {
    /// Student (admin only).
    pub student_id: Option<Uuid>,
    /// Status.
    pub status: Option<BillStatus>,
}

/// Room list filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomQuery {
    /// Building.
    pub building_id: Option<Uuid>,
    /// Occupancy status.
    pub status: Option<RoomStatus>,
}

/// Log date range.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogQuery {
    /// First day, inclusive.
    pub from: Option<NaiveDate>,
    /// Last day, inclusive.
    pub to: Option<NaiveDate>,
}

/// Offense list filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OffenseQuery {
    /// Student.
    pub student_id: Option<Uuid>,
}

/// Notification list filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationQuery {
    /// Only unread notifications.
    #[serde(default)]
    pub unread_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_requires_email() {
        let req = LoginRequest {
            email: "not-an-email".into(),
            password: "x".into(),
        };
        assert!(req.validate().is_err());

        let req = LoginRequest {
            email: "ana@dorm.edu".into(),
            password: "x".into(),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_review_rating_range() {
        let review = |rating| ReviewDto {
            rating,
            comment: None,
        };
        assert!(review(0).validate().is_err());
        assert!(review(6).validate().is_err());
        assert!(review(5).validate().is_ok());
    }

    #[test]
    fn test_payment_must_be_positive() {
        let dto = PaymentDto {
            amount: 0,
            method: "cash".into(),
            transaction_id: None,
            notes: None,
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_payment_amount_is_capped() {
        let payment = |amount| PaymentDto {
            amount,
            method: "cash".into(),
            transaction_id: None,
            notes: None,
        };
        assert!(payment(i64::MAX).validate().is_err());
        assert!(payment(dormhub_entity::bill::MAX_AMOUNT + 1).validate().is_err());
        assert!(payment(dormhub_entity::bill::MAX_AMOUNT).validate().is_ok());
    }

    #[test]
    fn test_form_query_accepts_legacy_labels() {
        let q: FormQuery = serde_json::from_str(r#"{"status":"In Progress"}"#).unwrap();
        assert_eq!(q.status, Some(FormStatus::InProgress));
        let q: FormQuery = serde_json::from_str(r#"{"status":"Pending"}"#).unwrap();
        assert_eq!(FormFilter::from(q).status, Some(FormStatus::Submitted));
    }
}
