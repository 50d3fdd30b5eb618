//! Service request form repository implementation.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use dormhub_core::error::{AppError, ErrorKind};
use dormhub_core::result::AppResult;
use dormhub_core::types::pagination::{PageRequest, PageResponse};
use dormhub_entity::form::{Form, FormStatus, FormType};

const INSERT_FORM: &str = "INSERT INTO forms (id, student_id, title, description, form_type, \
     preferred_timing, actual_timing, priority, assigned_staff_id, status, status_history, \
     attachments, feedback, previous_status, due_date, overdue_notified_at, created_at, updated_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
     RETURNING *";

/// Filter for form listings.
#[derive(Debug, Clone, Default)]
pub struct FormFilter {
    /// Restrict to one submitting student.
    pub student_id: Option<Uuid>,
    /// Restrict to one assigned staff member.
    pub staff_id: Option<Uuid>,
    /// Restrict to one status.
    pub status: Option<FormStatus>,
    /// Restrict to one request type.
    pub form_type: Option<FormType>,
}

/// Repository for service request forms.
#[derive(Debug, Clone)]
pub struct FormRepository {
    pool: PgPool,
}

impl FormRepository {
    /// Create a new form repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a form by primary key.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Form>> {
        sqlx::query_as::<_, Form>("SELECT * FROM forms WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find form", e))
    }

    /// List forms matching a filter, newest first.
    pub async fn find_all(
        &self,
        filter: &FormFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Form>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM forms \
             WHERE ($1::uuid IS NULL OR student_id = $1) \
               AND ($2::uuid IS NULL OR assigned_staff_id = $2) \
               AND ($3::form_status IS NULL OR status = $3) \
               AND ($4::form_type IS NULL OR form_type = $4)",
        )
        .bind(filter.student_id)
        .bind(filter.staff_id)
        .bind(filter.status)
        .bind(filter.form_type)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count forms", e))?;

        let forms = sqlx::query_as::<_, Form>(
            "SELECT * FROM forms \
             WHERE ($1::uuid IS NULL OR student_id = $1) \
               AND ($2::uuid IS NULL OR assigned_staff_id = $2) \
               AND ($3::form_status IS NULL OR status = $3) \
               AND ($4::form_type IS NULL OR form_type = $4) \
             ORDER BY created_at DESC LIMIT $5 OFFSET $6",
        )
        .bind(filter.student_id)
        .bind(filter.staff_id)
        .bind(filter.status)
        .bind(filter.form_type)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list forms", e))?;

        Ok(PageResponse::new(
            forms,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// Insert a newly submitted form.
    pub async fn create(&self, form: &Form) -> AppResult<Form> {
        bind_form(sqlx::query_as::<_, Form>(INSERT_FORM), form)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create form", e))
    }

    /// Persist workflow changes (status, history, assignment, timing,
    /// feedback and attachments).
    pub async fn update(&self, form: &Form) -> AppResult<Form> {
        sqlx::query_as::<_, Form>(
            "UPDATE forms SET title = $2, description = $3, preferred_timing = $4, \
             actual_timing = $5, assigned_staff_id = $6, status = $7, status_history = $8, \
             attachments = $9, feedback = $10, overdue_notified_at = $11, updated_at = $12 \
             WHERE id = $1 RETURNING *",
        )
        .bind(form.id)
        .bind(&form.title)
        .bind(&form.description)
        .bind(Json(&form.preferred_timing))
        .bind(Json(&form.actual_timing))
        .bind(form.assigned_staff_id)
        .bind(form.status)
        .bind(Json(&form.status_history))
        .bind(&form.attachments)
        .bind(Json(&form.feedback))
        .bind(form.overdue_notified_at)
        .bind(form.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update form", e))
    }

    /// Replace a form with its rescheduled successor: the new form is
    /// inserted and the original deleted in one transaction.
    pub async fn replace(&self, original_id: Uuid, replacement: &Form) -> AppResult<Form> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let created = bind_form(sqlx::query_as::<_, Form>(INSERT_FORM), replacement)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to insert rescheduled form", e)
            })?;

        let deleted = sqlx::query("DELETE FROM forms WHERE id = $1")
            .bind(original_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete original form", e)
            })?;
        if deleted.rows_affected() == 0 {
            return Err(AppError::not_found("Form not found"));
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit reschedule", e)
        })?;
        Ok(created)
    }

    /// Delete a form.
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM forms WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete form", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Forms still waiting on the dormitory (submitted, approved or
    /// assigned) past their due date whose overdue notice has not gone out.
    pub async fn find_overdue_unnotified(&self, now: DateTime<Utc>) -> AppResult<Vec<Form>> {
        sqlx::query_as::<_, Form>(
            "SELECT * FROM forms \
             WHERE due_date < $1 AND overdue_notified_at IS NULL \
               AND status IN ('submitted', 'approved', 'assigned') \
             ORDER BY due_date",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find overdue forms", e))
    }

    /// Record that the overdue notice for a form was sent.
    pub async fn mark_overdue_notified(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE forms SET overdue_notified_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to mark form overdue", e)
            })?;
        Ok(())
    }

    /// Count forms per status.
    pub async fn count_by_status(&self) -> AppResult<Vec<(FormStatus, i64)>> {
        sqlx::query_as::<_, (FormStatus, i64)>(
            "SELECT status, COUNT(*) FROM forms GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count forms", e))
    }
}

fn bind_form<'q>(
    query: sqlx::query::QueryAs<'q, sqlx::Postgres, Form, sqlx::postgres::PgArguments>,
    form: &'q Form,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, Form, sqlx::postgres::PgArguments> {
    query
        .bind(form.id)
        .bind(form.student_id)
        .bind(&form.title)
        .bind(&form.description)
        .bind(form.form_type)
        .bind(Json(&form.preferred_timing))
        .bind(Json(&form.actual_timing))
        .bind(form.priority)
        .bind(form.assigned_staff_id)
        .bind(form.status)
        .bind(Json(&form.status_history))
        .bind(&form.attachments)
        .bind(Json(&form.feedback))
        .bind(form.previous_status)
        .bind(form.due_date)
        .bind(form.overdue_notified_at)
        .bind(form.created_at)
        .bind(form.updated_at)
}
