//! Payment ledger rules for [`Bill`].
//!
//! `status` and `payment_status` are always written as a pair by
//! [`Bill::reconcile`] or one of the explicit overrides below, so the two
//! labels cannot disagree:
//!
//! | status    | payment_status                                  |
//! |-----------|-------------------------------------------------|
//! | `paid`    | `Paid`                                          |
//! | `overdue` | `Overdue`                                       |
//! | `pending` | `Unpaid`, `Partially Paid`, `Incomplete Payment` |

use chrono::{DateTime, Utc};
use uuid::Uuid;

use dormhub_core::{AppError, AppResult};

use super::model::{Bill, BillNote, BillStatus, MAX_AMOUNT, NewBill, Payment, PaymentStatus};

impl Bill {
    /// Issue a new, unpaid bill.
    pub fn issue(input: NewBill, room_id: Option<Uuid>, now: DateTime<Utc>) -> AppResult<Self> {
        let fees = [input.rental_fee, input.water_fee, input.electricity_fee]
            .into_iter()
            .chain(input.other_fees.iter().map(|f| f.amount));
        let mut total: i64 = 0;
        for fee in fees {
            if fee < 0 {
                return Err(AppError::validation("Fees must not be negative"));
            }
            total = total
                .checked_add(fee)
                .filter(|t| *t <= MAX_AMOUNT)
                .ok_or_else(|| {
                    AppError::validation(format!("Bill total must not exceed {MAX_AMOUNT}"))
                })?;
        }
        if input.billing_period_end < input.billing_period_start {
            return Err(AppError::validation(
                "Billing period must end after it starts",
            ));
        }

        let mut bill = Self {
            id: Uuid::new_v4(),
            student_id: input.student_id,
            room_id: input.room_id.or(room_id),
            rental_fee: input.rental_fee,
            water_fee: input.water_fee,
            electricity_fee: input.electricity_fee,
            other_fees: input.other_fees,
            billing_period_start: input.billing_period_start,
            billing_period_end: input.billing_period_end,
            due_date: input.due_date,
            amount_paid: 0,
            payments: Vec::new(),
            status: BillStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            receipt_path: None,
            notes: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        bill.reconcile(now);
        Ok(bill)
    }

    /// Rent + water + electricity + other fees. Never stored.
    ///
    /// Saturates instead of wrapping; `issue` already caps the total.
    pub fn total_amount(&self) -> i64 {
        self.other_fees.iter().fold(
            self.rental_fee
                .saturating_add(self.water_fee)
                .saturating_add(self.electricity_fee),
            |total, fee| total.saturating_add(fee.amount),
        )
    }

    /// Amount still owed.
    pub fn balance(&self) -> i64 {
        self.total_amount().saturating_sub(self.amount_paid).max(0)
    }

    /// Whether the payments cover the total.
    pub fn is_settled(&self) -> bool {
        self.amount_paid >= self.total_amount()
    }

    /// Record a payment and re-derive the status labels.
    pub fn add_payment(&mut self, payment: Payment, now: DateTime<Utc>) -> AppResult<()> {
        if payment.amount <= 0 {
            return Err(AppError::validation("Payment amount must be positive"));
        }
        if payment.amount > MAX_AMOUNT {
            return Err(AppError::validation(format!(
                "Payment amount must not exceed {MAX_AMOUNT}"
            )));
        }
        if self.status == BillStatus::Paid {
            return Err(AppError::conflict(format!(
                "Bill {} is already paid",
                self.id
            )));
        }
        self.amount_paid = self
            .amount_paid
            .checked_add(payment.amount)
            .ok_or_else(|| AppError::validation("Payment would overflow the amount paid"))?;
        self.payments.push(payment);
        self.reconcile(now);
        Ok(())
    }

    /// Derive both status labels from the ledger and the due date.
    pub fn reconcile(&mut self, now: DateTime<Utc>) {
        let (status, payment_status) = if self.is_settled() {
            (BillStatus::Paid, PaymentStatus::Paid)
        } else if now > self.due_date {
            (BillStatus::Overdue, PaymentStatus::Overdue)
        } else {
            (BillStatus::Pending, self.pending_label())
        };
        self.status = status;
        self.payment_status = payment_status;
        self.updated_at = now;
    }

    /// Settle the outstanding balance with an admin-recorded payment.
    pub fn settle(&mut self, method: &str, notes: Option<String>, now: DateTime<Utc>) -> AppResult<()> {
        let balance = self.balance();
        if balance == 0 {
            self.reconcile(now);
            return Ok(());
        }
        self.add_payment(
            Payment {
                amount: balance,
                payment_date: now,
                method: method.to_string(),
                transaction_id: None,
                notes,
            },
            now,
        )
    }

    /// Mark an unsettled bill overdue regardless of its due date.
    pub fn mark_overdue(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        if self.is_settled() {
            return Err(AppError::conflict(format!(
                "Bill {} is paid and cannot be marked overdue",
                self.id
            )));
        }
        self.status = BillStatus::Overdue;
        self.payment_status = PaymentStatus::Overdue;
        self.updated_at = now;
        Ok(())
    }

    /// Clear an overdue mark, returning an unsettled bill to pending.
    pub fn clear_overdue(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        if self.is_settled() {
            return Err(AppError::conflict(format!(
                "Bill {} is paid and cannot be set to pending",
                self.id
            )));
        }
        self.status = BillStatus::Pending;
        self.payment_status = self.pending_label();
        self.updated_at = now;
        Ok(())
    }

    /// Return all payments to the student.
    ///
    /// Resets the ledger, sets the bill back to pending and leaves a
    /// timestamped note. There is no undo.
    pub fn return_to_student(&mut self, reason: Option<&str>, now: DateTime<Utc>) {
        let had_payments = self.amount_paid > 0 || !self.payments.is_empty();
        let returned = self.amount_paid;

        self.amount_paid = 0;
        self.payments.clear();
        self.status = BillStatus::Pending;
        self.payment_status = if had_payments {
            PaymentStatus::IncompletePayment
        } else {
            PaymentStatus::Unpaid
        };

        let mut text = format!("Returned to student on {} ({returned} refunded)", now.to_rfc3339());
        if let Some(reason) = reason.filter(|r| !r.trim().is_empty()) {
            text.push_str(": ");
            text.push_str(reason.trim());
        }
        self.notes.push(BillNote {
            timestamp: now,
            text,
        });
        self.updated_at = now;
    }

    /// Whether the label pair is one of the allowed combinations.
    pub fn labels_consistent(&self) -> bool {
        match self.status {
            BillStatus::Paid => self.payment_status == PaymentStatus::Paid,
            BillStatus::Overdue => self.payment_status == PaymentStatus::Overdue,
            BillStatus::Pending => matches!(
                self.payment_status,
                PaymentStatus::Unpaid | PaymentStatus::PartiallyPaid | PaymentStatus::IncompletePayment
            ),
        }
    }

    fn pending_label(&self) -> PaymentStatus {
        if self.amount_paid > 0 {
            PaymentStatus::PartiallyPaid
        } else if self.payment_status == PaymentStatus::IncompletePayment {
            PaymentStatus::IncompletePayment
        } else {
            PaymentStatus::Unpaid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bill::model::OtherFee;
    use chrono::Duration;

    fn bill(now: DateTime<Utc>) -> Bill {
        Bill::issue(
            NewBill {
                student_id: Uuid::new_v4(),
                room_id: None,
                rental_fee: 1000,
                water_fee: 50,
                electricity_fee: 100,
                other_fees: vec![],
                billing_period_start: now - Duration::days(30),
                billing_period_end: now,
                due_date: now + Duration::days(14),
            },
            None,
            now,
        )
        .unwrap()
    }

    fn pay(amount: i64, now: DateTime<Utc>) -> Payment {
        Payment {
            amount,
            payment_date: now,
            method: "cash".to_string(),
            transaction_id: None,
            notes: None,
        }
    }

    fn ledger_holds(bill: &Bill) {
        assert_eq!(
            bill.amount_paid,
            bill.payments.iter().map(|p| p.amount).sum::<i64>()
        );
        if bill.status == BillStatus::Paid {
            assert!(bill.amount_paid >= bill.total_amount());
        }
        assert!(bill.labels_consistent());
    }

    #[test]
    fn test_partial_then_full_payment() {
        let now = Utc::now();
        let mut b = bill(now);
        assert_eq!(b.total_amount(), 1150);

        b.add_payment(pay(600, now), now).unwrap();
        assert_eq!(b.amount_paid, 600);
        assert_eq!(b.status, BillStatus::Pending);
        assert_eq!(b.payment_status, PaymentStatus::PartiallyPaid);
        ledger_holds(&b);

        b.add_payment(pay(550, now), now).unwrap();
        assert_eq!(b.amount_paid, 1150);
        assert_eq!(b.status, BillStatus::Paid);
        assert_eq!(b.payment_status, PaymentStatus::Paid);
        ledger_holds(&b);
    }

    #[test]
    fn test_other_fees_count_toward_total() {
        let now = Utc::now();
        let mut b = bill(now);
        b.other_fees.push(OtherFee {
            description: "Laundry".to_string(),
            amount: 25,
        });
        assert_eq!(b.total_amount(), 1175);
        assert_eq!(b.balance(), 1175);
    }

    #[test]
    fn test_non_positive_payment_rejected() {
        let now = Utc::now();
        let mut b = bill(now);
        assert!(b.add_payment(pay(0, now), now).is_err());
        assert!(b.add_payment(pay(-5, now), now).is_err());
        assert!(b.payments.is_empty());
    }

    #[test]
    fn test_paid_bill_refuses_more_payments() {
        let now = Utc::now();
        let mut b = bill(now);
        b.add_payment(pay(1150, now), now).unwrap();
        let err = b.add_payment(pay(1, now), now).unwrap_err();
        assert_eq!(err.kind, dormhub_core::error::ErrorKind::Conflict);
    }

    #[test]
    fn test_past_due_reconciles_to_overdue() {
        let now = Utc::now();
        let mut b = bill(now);
        b.add_payment(pay(100, now), now).unwrap();
        b.reconcile(b.due_date + Duration::hours(1));
        assert_eq!(b.status, BillStatus::Overdue);
        assert_eq!(b.payment_status, PaymentStatus::Overdue);
        ledger_holds(&b);
    }

    #[test]
    fn test_return_after_payment_is_incomplete() {
        let now = Utc::now();
        let mut b = bill(now);
        b.add_payment(pay(600, now), now).unwrap();
        b.return_to_student(Some("Wrong amount"), now);
        assert_eq!(b.amount_paid, 0);
        assert!(b.payments.is_empty());
        assert_eq!(b.status, BillStatus::Pending);
        assert_eq!(b.payment_status, PaymentStatus::IncompletePayment);
        assert_eq!(b.notes.len(), 1);
        assert!(b.notes[0].text.contains("Wrong amount"));
        ledger_holds(&b);
    }

    #[test]
    fn test_return_without_payment_is_unpaid() {
        let now = Utc::now();
        let mut b = bill(now);
        b.return_to_student(None, now);
        assert_eq!(b.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn test_return_of_paid_bill_reopens_it() {
        let now = Utc::now();
        let mut b = bill(now);
        b.add_payment(pay(1150, now), now).unwrap();
        b.return_to_student(None, now);
        assert_eq!(b.status, BillStatus::Pending);
        b.add_payment(pay(100, now), now).unwrap();
        assert_eq!(b.payment_status, PaymentStatus::PartiallyPaid);
        ledger_holds(&b);
    }

    #[test]
    fn test_settle_pays_balance() {
        let now = Utc::now();
        let mut b = bill(now);
        b.add_payment(pay(150, now), now).unwrap();
        b.settle("admin", Some("cash at desk".into()), now).unwrap();
        assert_eq!(b.amount_paid, 1150);
        assert_eq!(b.payments.last().unwrap().amount, 1000);
        assert_eq!(b.status, BillStatus::Paid);
        ledger_holds(&b);
    }

    #[test]
    fn test_overdue_mark_and_clear() {
        let now = Utc::now();
        let mut b = bill(now);
        b.mark_overdue(now).unwrap();
        assert_eq!(b.status, BillStatus::Overdue);
        ledger_holds(&b);
        b.clear_overdue(now).unwrap();
        assert_eq!(b.status, BillStatus::Pending);
        assert_eq!(b.payment_status, PaymentStatus::Unpaid);
        ledger_holds(&b);

        b.settle("admin", None, now).unwrap();
        assert!(b.mark_overdue(now).is_err());
    }

    #[test]
    fn test_oversized_payment_rejected_without_touching_ledger() {
        let now = Utc::now();
        let mut b = bill(now);
        b.add_payment(pay(1, now), now).unwrap();
        let err = b.add_payment(pay(i64::MAX, now), now).unwrap_err();
        assert_eq!(err.kind, dormhub_core::error::ErrorKind::Validation);
        assert_eq!(b.amount_paid, 1);
        assert_eq!(b.payments.len(), 1);
        assert_eq!(b.status, BillStatus::Pending);
        ledger_holds(&b);
    }

    #[test]
    fn test_payment_overflow_is_validation_error() {
        let now = Utc::now();
        let mut b = bill(now);
        // Stored ledgers are trusted as loaded.
        b.amount_paid = i64::MAX - 10;
        let err = b.add_payment(pay(MAX_AMOUNT, now), now).unwrap_err();
        assert_eq!(err.kind, dormhub_core::error::ErrorKind::Validation);
        assert_eq!(b.amount_paid, i64::MAX - 10);
        assert!(b.payments.is_empty());
    }

    #[test]
    fn test_total_beyond_cap_rejected() {
        let now = Utc::now();
        let result = Bill::issue(
            NewBill {
                student_id: Uuid::new_v4(),
                room_id: None,
                rental_fee: MAX_AMOUNT,
                water_fee: 0,
                electricity_fee: 0,
                other_fees: vec![
                    OtherFee {
                        description: "Laundry".to_string(),
                        amount: i64::MAX,
                    },
                    OtherFee {
                        description: "Parking".to_string(),
                        amount: i64::MAX,
                    },
                ],
                billing_period_start: now,
                billing_period_end: now,
                due_date: now,
            },
            None,
            now,
        );
        let err = result.unwrap_err();
        assert_eq!(err.kind, dormhub_core::error::ErrorKind::Validation);
    }

    #[test]
    fn test_total_saturates_on_corrupt_fees() {
        let now = Utc::now();
        let mut b = bill(now);
        b.rental_fee = i64::MAX;
        assert_eq!(b.total_amount(), i64::MAX);
        assert_eq!(b.balance(), i64::MAX);
    }

    #[test]
    fn test_negative_fee_rejected() {
        let now = Utc::now();
        let result = Bill::issue(
            NewBill {
                student_id: Uuid::new_v4(),
                room_id: None,
                rental_fee: -1,
                water_fee: 0,
                electricity_fee: 0,
                other_fees: vec![],
                billing_period_start: now,
                billing_period_end: now,
                due_date: now,
            },
            None,
            now,
        );
        assert!(result.is_err());
    }
}
