//! Bill entity model.
//!
//! Amounts are integers in the currency's minor unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use dormhub_core::AppError;

/// Largest amount accepted for a single fee, a payment or a bill total.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

/// Coarse workflow status of a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "bill_status", rename_all = "snake_case")]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    /// Not yet settled.
    Pending,
    /// Fully settled.
    Paid,
    /// Past its due date and not settled.
    Overdue,
}

impl BillStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
        }
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BillStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "overdue" => Ok(Self::Overdue),
            _ => Err(AppError::validation(format!(
                "Invalid bill status: '{s}'. Expected one of: pending, paid, overdue"
            ))),
        }
    }
}

/// Fine-grained payment label shown to students.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Nothing paid.
    Unpaid,
    /// Some but not all paid.
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    /// Fully paid.
    Paid,
    /// Past due and not fully paid.
    Overdue,
    /// Payments were returned to the student.
    #[serde(rename = "Incomplete Payment")]
    IncompletePayment,
}

impl PaymentStatus {
    /// Return the label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "Unpaid",
            Self::PartiallyPaid => "Partially Paid",
            Self::Paid => "Paid",
            Self::Overdue => "Overdue",
            Self::IncompletePayment => "Incomplete Payment",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An additional line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtherFee {
    /// What the fee is for.
    pub description: String,
    /// Amount.
    pub amount: i64,
}

/// A recorded payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Amount paid.
    pub amount: i64,
    /// When it was paid.
    pub payment_date: DateTime<Utc>,
    /// Payment method (cash, transfer, ...).
    pub method: String,
    /// External transaction reference.
    pub transaction_id: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// A timestamped administrative note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillNote {
    /// When the note was written.
    pub timestamp: DateTime<Utc>,
    /// Note text.
    pub text: String,
}

/// A bill issued to a student.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Bill {
    /// Unique identifier.
    pub id: Uuid,
    /// Billed student.
    pub student_id: Uuid,
    /// Room the bill is for.
    pub room_id: Option<Uuid>,
    /// Rent.
    pub rental_fee: i64,
    /// Water.
    pub water_fee: i64,
    /// Electricity.
    pub electricity_fee: i64,
    /// Extra line items.
    #[sqlx(json)]
    pub other_fees: Vec<OtherFee>,
    /// Start of the billed period.
    pub billing_period_start: DateTime<Utc>,
    /// End of the billed period.
    pub billing_period_end: DateTime<Utc>,
    /// Payment deadline.
    pub due_date: DateTime<Utc>,
    /// Sum of `payments`.
    pub amount_paid: i64,
    /// Append-only payment list (cleared only by a return).
    #[sqlx(json)]
    pub payments: Vec<Payment>,
    /// Coarse status.
    pub status: BillStatus,
    /// Fine-grained label.
    pub payment_status: PaymentStatus,
    /// Uploaded receipt path.
    pub receipt_path: Option<String>,
    /// Administrative notes.
    #[sqlx(json)]
    pub notes: Vec<BillNote>,
    /// When the bill was created.
    pub created_at: DateTime<Utc>,
    /// When the bill was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Data required to issue a bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBill {
    /// Billed student.
    pub student_id: Uuid,
    /// Room; defaults to the student's current room.
    pub room_id: Option<Uuid>,
    /// Rent.
    pub rental_fee: i64,
    /// Water.
    #[serde(default)]
    pub water_fee: i64,
    /// Electricity.
    #[serde(default)]
    pub electricity_fee: i64,
    /// Extra line items.
    #[serde(default)]
    pub other_fees: Vec<OtherFee>,
    /// Start of the billed period.
    pub billing_period_start: DateTime<Utc>,
    /// End of the billed period.
    pub billing_period_end: DateTime<Utc>,
    /// Payment deadline.
    pub due_date: DateTime<Utc>,
}
