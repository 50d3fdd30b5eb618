//! Bill repository implementation.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use dormhub_core::error::{AppError, ErrorKind};
use dormhub_core::result::AppResult;
use dormhub_core::types::pagination::{PageRequest, PageResponse};
use dormhub_entity::bill::{Bill, BillStatus};

/// Aggregate amounts across all bills, in minor units.
#[derive(Debug, Clone, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct BillTotals {
    /// Sum of every bill's total.
    pub billed: i64,
    /// Sum of every bill's paid amount.
    pub collected: i64,
    /// Number of overdue bills.
    pub overdue_count: i64,
}

/// Repository for bills.
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: PgPool,
}

impl BillRepository {
    /// Create a new bill repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a bill by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Bill>> {
        sqlx::query_as::<_, Bill>("SELECT * FROM bills WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find bill", e))
    }

    /// List bills with optional student and status filters, newest first.
    pub async fn find_all(
        &self,
        student_id: Option<Uuid>,
        status: Option<BillStatus>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Bill>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bills \
             WHERE ($1::uuid IS NULL OR student_id = $1) \
               AND ($2::bill_status IS NULL OR status = $2)",
        )
        .bind(student_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count bills", e))?;

        let bills = sqlx::query_as::<_, Bill>(
            "SELECT * FROM bills \
             WHERE ($1::uuid IS NULL OR student_id = $1) \
               AND ($2::bill_status IS NULL OR status = $2) \
             ORDER BY billing_period_start DESC, created_at DESC LIMIT $3 OFFSET $4",
        )
        .bind(student_id)
        .bind(status)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list bills", e))?;

        Ok(PageResponse::new(
            bills,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// Insert a newly issued bill.
    pub async fn create(&self, bill: &Bill) -> AppResult<Bill> {
        sqlx::query_as::<_, Bill>(
            "INSERT INTO bills (id, student_id, room_id, rental_fee, water_fee, electricity_fee, \
             other_fees, billing_period_start, billing_period_end, due_date, amount_paid, payments, \
             status, payment_status, receipt_path, notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
             RETURNING *",
        )
        .bind(bill.id)
        .bind(bill.student_id)
        .bind(bill.room_id)
        .bind(bill.rental_fee)
        .bind(bill.water_fee)
        .bind(bill.electricity_fee)
        .bind(Json(&bill.other_fees))
        .bind(bill.billing_period_start)
        .bind(bill.billing_period_end)
        .bind(bill.due_date)
        .bind(bill.amount_paid)
        .bind(Json(&bill.payments))
        .bind(bill.status)
        .bind(bill.payment_status)
        .bind(&bill.receipt_path)
        .bind(Json(&bill.notes))
        .bind(bill.created_at)
        .bind(bill.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create bill", e))
    }

    /// Apply `change` to the bill while its row is locked, then persist
    /// the ledger (payments, both labels, notes) in the same transaction.
    ///
    /// Concurrent changes to one bill serialize on the row lock. When
    /// `change` fails nothing is written. Returns the stored bill and
    /// whatever `change` returned.
    pub async fn update_ledger<T, F>(&self, id: Uuid, change: F) -> AppResult<(Bill, T)>
    where
        F: FnOnce(&mut Bill) -> AppResult<T>,
    {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let mut bill = sqlx::query_as::<_, Bill>("SELECT * FROM bills WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to lock bill", e))?
            .ok_or_else(|| AppError::not_found("Bill not found"))?;

        let value = change(&mut bill)?;
        let bill = write_ledger(&mut tx, &bill).await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
        })?;
        Ok((bill, value))
    }

    /// Store a receipt path without touching the ledger columns.
    pub async fn set_receipt(
        &self,
        id: Uuid,
        path: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Bill>> {
        sqlx::query_as::<_, Bill>(
            "UPDATE bills SET receipt_path = $2, updated_at = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(path)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to store receipt", e))
    }

    /// Delete a bill.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM bills WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete bill", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Pending bills whose due date has passed.
    pub async fn find_past_due(&self, now: DateTime<Utc>) -> AppResult<Vec<Bill>> {
        sqlx::query_as::<_, Bill>(
            "SELECT * FROM bills WHERE status = 'pending' AND due_date < $1 ORDER BY due_date",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find past-due bills", e))
    }

    /// Billed and collected totals.
    pub async fn totals(&self) -> AppResult<BillTotals> {
        sqlx::query_as::<_, BillTotals>(
            "SELECT \
               COALESCE(SUM(rental_fee + water_fee + electricity_fee + \
                 COALESCE((SELECT SUM((f->>'amount')::bigint) FROM jsonb_array_elements(other_fees) f), 0)), 0)::bigint AS billed, \
               COALESCE(SUM(amount_paid), 0)::bigint AS collected, \
               COUNT(*) FILTER (WHERE status = 'overdue') AS overdue_count \
             FROM bills",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to total bills", e))
    }
}

async fn write_ledger(tx: &mut Transaction<'static, Postgres>, bill: &Bill) -> AppResult<Bill> {
    sqlx::query_as::<_, Bill>(
        "UPDATE bills SET amount_paid = $2, payments = $3, status = $4, payment_status = $5, \
         notes = $6, updated_at = $7 WHERE id = $1 RETURNING *",
    )
    .bind(bill.id)
    .bind(bill.amount_paid)
    .bind(Json(&bill.payments))
    .bind(bill.status)
    .bind(bill.payment_status)
    .bind(Json(&bill.notes))
    .bind(bill.updated_at)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save bill", e))
}
