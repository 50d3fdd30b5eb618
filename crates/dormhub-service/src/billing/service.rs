//! Billing ledger operations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use dormhub_core::AppError;
use dormhub_core::result::AppResult;
use dormhub_core::types::pagination::{PageRequest, PageResponse};
use dormhub_database::repositories::{BillRepository, StudentRepository};
use dormhub_entity::account::Role;
use dormhub_entity::bill::{Bill, BillStatus, NewBill, Payment};

use crate::context::RequestContext;
use crate::effects::{EffectExecutor, Outcome};
use crate::notification::rules;

/// A payment against a bill.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    /// Amount in minor currency units.
    pub amount: i64,
    /// Payment method, e.g. "cash" or "bank_transfer".
    pub method: String,
    /// External transaction reference.
    pub transaction_id: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// Attach `BillPaid` notices when a change settled the bill.
fn settle_outcome(bill: Bill, was_paid: bool) -> Outcome<Bill> {
    if !was_paid && bill.status == BillStatus::Paid {
        let notices = rules::bill_paid(&bill);
        Outcome::new(bill).notify_all(notices)
    } else {
        Outcome::new(bill)
    }
}

/// Students only see their own bills; anyone else's look missing.
fn ensure_visible(ctx: &RequestContext, bill: &Bill) -> AppResult<()> {
    if ctx.role == Role::Student && bill.student_id != ctx.user_id {
        return Err(AppError::not_found("Bill not found"));
    }
    Ok(())
}

/// Issues bills and keeps their ledgers.
///
/// Every ledger change runs through [`BillRepository::update_ledger`], so
/// the read-modify-write happens under the bill's row lock.
#[derive(Debug, Clone)]
pub struct BillingService {
    /// Bill repository.
    bill_repo: Arc<BillRepository>,
    /// Student repository.
    student_repo: Arc<StudentRepository>,
    /// Side-effect runner.
    effects: Arc<EffectExecutor>,
}

impl BillingService {
    /// Creates a new billing service.
    pub fn new(
        bill_repo: Arc<BillRepository>,
        student_repo: Arc<StudentRepository>,
        effects: Arc<EffectExecutor>,
    ) -> Self {
        Self {
            bill_repo,
            student_repo,
            effects,
        }
    }

    async fn load(&self, id: Uuid) -> AppResult<Bill> {
        self.bill_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Bill not found"))
    }

    /// Gets a bill; students only see their own.
    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Bill> {
        let bill = self.load(id).await?;
        ensure_visible(ctx, &bill)?;
        Ok(bill)
    }

    /// Lists bills; students only see their own.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        student_id: Option<Uuid>,
        status: Option<BillStatus>,
        page: PageRequest,
    ) -> AppResult<PageResponse<Bill>> {
        let student_id = match ctx.role {
            Role::Student => Some(ctx.user_id),
            _ => student_id,
        };
        self.bill_repo
            .find_all(student_id, status, &page.normalized())
            .await
    }

    /// Issues a bill. The room defaults to the student's current room.
    pub async fn create(&self, ctx: &RequestContext, input: NewBill) -> AppResult<Bill> {
        let student = self
            .student_repo
            .find_by_id(input.student_id)
            .await?
            .ok_or_else(|| AppError::not_found("Student not found"))?;

        let bill = Bill::issue(input, student.room_id, Utc::now())?;
        let bill = self.bill_repo.create(&bill).await?;
        info!(
            bill_id = %bill.id,
            student_id = %student.id,
            total = bill.total_amount(),
            admin_id = %ctx.user_id,
            "Bill issued"
        );

        let notice = rules::bill_created(&bill);
        Ok(self.effects.apply(Outcome::new(bill).notify(notice)).await)
    }

    /// Records a payment. Students may only pay their own bills.
    pub async fn pay(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        req: PaymentRequest,
    ) -> AppResult<Bill> {
        if req.method.trim().is_empty() {
            return Err(AppError::validation("Payment method is required"));
        }
        let now = Utc::now();
        let payment = Payment {
            amount: req.amount,
            payment_date: now,
            method: req.method.trim().to_string(),
            transaction_id: req.transaction_id,
            notes: req.notes,
        };
        let (bill, was_paid) = self
            .bill_repo
            .update_ledger(id, |bill| {
                ensure_visible(ctx, bill)?;
                let was_paid = bill.status == BillStatus::Paid;
                bill.add_payment(payment, now)?;
                Ok(was_paid)
            })
            .await?;

        info!(
            bill_id = %id,
            amount = req.amount,
            amount_paid = bill.amount_paid,
            status = bill.status.as_str(),
            by = %ctx.user_id,
            "Payment recorded"
        );
        Ok(self.effects.apply(settle_outcome(bill, was_paid)).await)
    }

    /// Admin status override: `paid` settles the balance, `overdue` marks
    /// the bill overdue, `pending` clears an overdue mark.
    pub async fn update_status(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        status: BillStatus,
        notes: Option<String>,
    ) -> AppResult<Bill> {
        let now = Utc::now();
        let (bill, was_paid) = self
            .bill_repo
            .update_ledger(id, |bill| {
                let was_paid = bill.status == BillStatus::Paid;
                match status {
                    BillStatus::Paid => bill.settle("admin", notes, now)?,
                    BillStatus::Overdue => bill.mark_overdue(now)?,
                    BillStatus::Pending => bill.clear_overdue(now)?,
                }
                Ok(was_paid)
            })
            .await?;
        info!(bill_id = %id, status = bill.status.as_str(), admin_id = %ctx.user_id, "Bill status set");

        let outcome = match status {
            BillStatus::Overdue => {
                let notice = rules::bill_overdue(&bill);
                Outcome::new(bill).notify(notice)
            }
            _ => settle_outcome(bill, was_paid),
        };
        Ok(self.effects.apply(outcome).await)
    }

    /// Returns all payments to the student. Irreversible.
    pub async fn return_to_student(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        reason: Option<String>,
    ) -> AppResult<Bill> {
        let now = Utc::now();
        let (bill, ()) = self
            .bill_repo
            .update_ledger(id, |bill| {
                bill.return_to_student(reason.as_deref(), now);
                Ok(())
            })
            .await?;
        info!(bill_id = %id, admin_id = %ctx.user_id, "Bill returned to student");

        let notice = rules::bill_returned(&bill, reason.as_deref());
        Ok(self.effects.apply(Outcome::new(bill).notify(notice)).await)
    }

    /// Stores the path of an uploaded payment receipt. Only the receipt
    /// column is written, so a concurrent payment is never undone.
    pub async fn attach_receipt(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        path: String,
    ) -> AppResult<Bill> {
        self.get(ctx, id).await?;
        self.bill_repo
            .set_receipt(id, &path, Utc::now())
            .await?
            .ok_or_else(|| AppError::not_found("Bill not found"))
    }

    /// Deletes a bill.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        if !self.bill_repo.delete(id).await? {
            return Err(AppError::not_found("Bill not found"));
        }
        info!(bill_id = %id, admin_id = %ctx.user_id, "Bill deleted");
        Ok(())
    }

    /// Re-derives the labels of pending bills past their due date and
    /// tells each student once. Returns how many bills turned overdue.
    pub async fn sweep_overdue(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let bills = self.bill_repo.find_past_due(now).await?;
        let mut flagged = 0;
        for stale in bills {
            let (bill, turned_overdue) = self
                .bill_repo
                .update_ledger(stale.id, |bill| {
                    let was_overdue = bill.status == BillStatus::Overdue;
                    bill.reconcile(now);
                    Ok(!was_overdue && bill.status == BillStatus::Overdue)
                })
                .await?;
            if turned_overdue {
                let notice = rules::bill_overdue(&bill);
                self.effects.apply(Outcome::new(()).notify(notice)).await;
                flagged += 1;
            }
        }
        if flagged > 0 {
            info!(count = flagged, "Overdue bills flagged");
        }
        Ok(flagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use dormhub_entity::bill::{OtherFee, PaymentStatus};

    fn bill() -> Bill {
        let now = Utc::now();
        Bill::issue(
            NewBill {
                student_id: Uuid::new_v4(),
                room_id: None,
                rental_fee: 1000,
                water_fee: 50,
                electricity_fee: 100,
                other_fees: vec![OtherFee {
                    description: "Laundry".into(),
                    amount: 0,
                }],
                billing_period_start: now - Duration::days(30),
                billing_period_end: now,
                due_date: now + Duration::days(7),
            },
            None,
            now,
        )
        .unwrap()
    }

    fn payment(amount: i64) -> Payment {
        Payment {
            amount,
            payment_date: Utc::now(),
            method: "cash".into(),
            transaction_id: None,
            notes: None,
        }
    }

    fn ctx(user_id: Uuid, role: Role) -> RequestContext {
        RequestContext::new(user_id, role, "Test")
    }

    #[test]
    fn test_students_only_see_their_own_bills() {
        let bill = bill();
        let owner = ctx(bill.student_id, Role::Student);
        assert!(ensure_visible(&owner, &bill).is_ok());

        let stranger = ctx(Uuid::new_v4(), Role::Student);
        let err = ensure_visible(&stranger, &bill).unwrap_err();
        assert_eq!(err.kind, dormhub_core::error::ErrorKind::NotFound);

        let admin = ctx(Uuid::new_v4(), Role::Admin);
        assert!(ensure_visible(&admin, &bill).is_ok());
    }

    #[test]
    fn test_partial_then_full_payment_notifies_once() {
        let mut bill = bill();
        bill.add_payment(payment(600), Utc::now()).unwrap();
        assert_eq!(bill.payment_status, PaymentStatus::PartiallyPaid);
        let outcome = settle_outcome(bill.clone(), false);
        assert!(outcome.effects.is_empty());

        bill.add_payment(payment(550), Utc::now()).unwrap();
        assert_eq!(bill.status, BillStatus::Paid);
        let outcome = settle_outcome(bill.clone(), false);
        assert_eq!(outcome.effects.len(), 2);

        let outcome = settle_outcome(bill, true);
        assert!(outcome.effects.is_empty());
    }
}
