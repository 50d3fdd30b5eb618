//! Notification repository implementation.
//!
//! A notification is visible to an account when its `recipient_model`
//! matches the account's role and it either names the account or is a
//! role broadcast (`recipient_id IS NULL`).
//!
//! Broadcast rows are shared, so each account's read and dismissed state
//! for them lives in `notification_receipts`. Direct rows carry their own
//! `is_read` and are deleted outright.

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use dormhub_core::error::{AppError, ErrorKind};
use dormhub_core::result::AppResult;
use dormhub_core::types::pagination::{PageRequest, PageResponse};
use dormhub_entity::notification::{Notification, RecipientModel};

/// Rows visible to account `$2` of model `$1`, joined with its receipt.
const VISIBLE: &str = "FROM notifications n \
     LEFT JOIN notification_receipts r ON r.notification_id = n.id AND r.account_id = $2 \
     WHERE n.recipient_model = $1 \
       AND (n.recipient_id = $2 OR (n.recipient_id IS NULL AND NOT COALESCE(r.dismissed, FALSE)))";

/// Read state as seen by the account.
const READ_STATE: &str =
    "CASE WHEN n.recipient_id IS NULL THEN COALESCE(r.is_read, FALSE) ELSE n.is_read END";

/// Repository for persisted notifications.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a notification.
    pub async fn create(&self, notif: &Notification) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (id, recipient_model, recipient_id, type, title, content, \
             priority, is_read, related_model, related_id, metadata, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING *",
        )
        .bind(notif.id)
        .bind(notif.recipient_model)
        .bind(notif.recipient_id)
        .bind(notif.kind)
        .bind(&notif.title)
        .bind(&notif.content)
        .bind(notif.priority)
        .bind(notif.is_read)
        .bind(&notif.related_model)
        .bind(notif.related_id)
        .bind(&notif.metadata)
        .bind(notif.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create notification", e))
    }

    /// List the notifications visible to an account, newest first.
    /// `is_read` reflects the account's own read state.
    pub async fn find_visible(
        &self,
        model: RecipientModel,
        account_id: Uuid,
        unread_only: bool,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) {VISIBLE} AND (NOT $3 OR NOT {READ_STATE})"
        ))
        .bind(model)
        .bind(account_id)
        .bind(unread_only)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count notifications", e))?;

        let notifs = sqlx::query_as::<_, Notification>(&format!(
            "SELECT n.id, n.recipient_model, n.recipient_id, n.type, n.title, n.content, \
             n.priority, {READ_STATE} AS is_read, n.related_model, n.related_id, n.metadata, \
             n.created_at {VISIBLE} AND (NOT $3 OR NOT {READ_STATE}) \
             ORDER BY n.created_at DESC LIMIT $4 OFFSET $5"
        ))
        .bind(model)
        .bind(account_id)
        .bind(unread_only)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list notifications", e))?;

        Ok(PageResponse::new(
            notifs,
            page.page,
            page.page_size,
            total as u64,
        ))
    }

    /// Count unread notifications visible to an account.
    pub async fn count_unread(&self, model: RecipientModel, account_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar(&format!(
            "SELECT COUNT(*) {VISIBLE} AND NOT {READ_STATE}"
        ))
        .bind(model)
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count unread", e))
    }

    /// Mark one visible notification as read for this account. Returns
    /// `false` when it does not exist, is not visible to the account or
    /// was dismissed.
    pub async fn mark_read(
        &self,
        id: Uuid,
        model: RecipientModel,
        account_id: Uuid,
    ) -> AppResult<bool> {
        let direct = sqlx::query(
            "UPDATE notifications SET is_read = TRUE \
             WHERE id = $3 AND recipient_model = $1 AND recipient_id = $2",
        )
        .bind(model)
        .bind(account_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark read", e))?;
        if direct.rows_affected() > 0 {
            return Ok(true);
        }

        let broadcast = sqlx::query(
            "INSERT INTO notification_receipts (notification_id, account_id, is_read) \
             SELECT id, $2, TRUE FROM notifications \
             WHERE id = $3 AND recipient_model = $1 AND recipient_id IS NULL \
             ON CONFLICT (notification_id, account_id) DO UPDATE \
             SET is_read = TRUE, updated_at = NOW() \
             WHERE NOT notification_receipts.dismissed",
        )
        .bind(model)
        .bind(account_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark read", e))?;
        Ok(broadcast.rows_affected() > 0)
    }

    /// Mark every visible notification as read for this account.
    pub async fn mark_all_read(&self, model: RecipientModel, account_id: Uuid) -> AppResult<u64> {
        let mut tx = self.begin().await?;

        let direct = sqlx::query(
            "UPDATE notifications SET is_read = TRUE \
             WHERE recipient_model = $1 AND recipient_id = $2 AND is_read = FALSE",
        )
        .bind(model)
        .bind(account_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark all read", e))?;

        let broadcast = sqlx::query(
            "INSERT INTO notification_receipts (notification_id, account_id, is_read) \
             SELECT id, $2, TRUE FROM notifications \
             WHERE recipient_model = $1 AND recipient_id IS NULL \
             ON CONFLICT (notification_id, account_id) DO UPDATE \
             SET is_read = TRUE, updated_at = NOW() \
             WHERE NOT notification_receipts.is_read AND NOT notification_receipts.dismissed",
        )
        .bind(model)
        .bind(account_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark all read", e))?;

        commit(tx).await?;
        Ok(direct.rows_affected() + broadcast.rows_affected())
    }

    /// Delete one notification for this account. A direct row is removed;
    /// a broadcast is dismissed for this account only.
    pub async fn delete(&self, id: Uuid, model: RecipientModel, account_id: Uuid) -> AppResult<bool> {
        let direct = sqlx::query(
            "DELETE FROM notifications WHERE id = $3 AND recipient_model = $1 AND recipient_id = $2",
        )
        .bind(model)
        .bind(account_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete notification", e))?;
        if direct.rows_affected() > 0 {
            return Ok(true);
        }

        let broadcast = sqlx::query(
            "INSERT INTO notification_receipts (notification_id, account_id, dismissed) \
             SELECT id, $2, TRUE FROM notifications \
             WHERE id = $3 AND recipient_model = $1 AND recipient_id IS NULL \
             ON CONFLICT (notification_id, account_id) DO UPDATE \
             SET dismissed = TRUE, updated_at = NOW() \
             WHERE NOT notification_receipts.dismissed",
        )
        .bind(model)
        .bind(account_id)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete notification", e))?;
        Ok(broadcast.rows_affected() > 0)
    }

    /// Delete every notification visible to the account: direct rows are
    /// removed, broadcasts dismissed for this account.
    pub async fn delete_all(&self, model: RecipientModel, account_id: Uuid) -> AppResult<u64> {
        let mut tx = self.begin().await?;

        let direct = sqlx::query(
            "DELETE FROM notifications WHERE recipient_model = $1 AND recipient_id = $2",
        )
        .bind(model)
        .bind(account_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to delete notifications", e)
        })?;

        let broadcast = sqlx::query(
            "INSERT INTO notification_receipts (notification_id, account_id, dismissed) \
             SELECT id, $2, TRUE FROM notifications \
             WHERE recipient_model = $1 AND recipient_id IS NULL \
             ON CONFLICT (notification_id, account_id) DO UPDATE \
             SET dismissed = TRUE, updated_at = NOW() \
             WHERE NOT notification_receipts.dismissed",
        )
        .bind(model)
        .bind(account_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to dismiss notifications", e)
        })?;

        commit(tx).await?;
        Ok(direct.rows_affected() + broadcast.rows_affected())
    }

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })
    }
}

async fn commit(tx: Transaction<'static, Postgres>) -> AppResult<()> {
    tx.commit().await.map_err(|e| {
        AppError::with_source(ErrorKind::Database, "Failed to commit transaction", e)
    })
}
