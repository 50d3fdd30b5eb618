//! Notification inbox operations for the signed-in account.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use dormhub_core::AppError;
use dormhub_core::result::AppResult;
use dormhub_core::types::pagination::{PageRequest, PageResponse};
use dormhub_database::repositories::NotificationRepository;
use dormhub_entity::notification::Notification;

use crate::context::RequestContext;

/// Lists and manages the notifications visible to an account.
///
/// Direct notifications belong to one account. Broadcast rows are shared
/// by everyone of the addressed kind, but reading or deleting one only
/// changes the caller's own view of it.
#[derive(Debug, Clone)]
pub struct NotificationService {
    /// Notification repository.
    notif_repo: Arc<NotificationRepository>,
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(notif_repo: Arc<NotificationRepository>) -> Self {
        Self { notif_repo }
    }

    /// Lists notifications for the current account, newest first.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        unread_only: bool,
        page: PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        self.notif_repo
            .find_visible(ctx.recipient_model(), ctx.user_id, unread_only, &page.normalized())
            .await
    }

    /// Gets the unread notification count.
    pub async fn unread_count(&self, ctx: &RequestContext) -> AppResult<i64> {
        self.notif_repo
            .count_unread(ctx.recipient_model(), ctx.user_id)
            .await
    }

    /// Marks a notification as read.
    pub async fn mark_read(&self, ctx: &RequestContext, notification_id: Uuid) -> AppResult<()> {
        let updated = self
            .notif_repo
            .mark_read(notification_id, ctx.recipient_model(), ctx.user_id)
            .await?;
        if !updated {
            return Err(AppError::not_found("Notification not found"));
        }
        Ok(())
    }

    /// Marks every visible notification as read.
    pub async fn mark_all_read(&self, ctx: &RequestContext) -> AppResult<u64> {
        let count = self
            .notif_repo
            .mark_all_read(ctx.recipient_model(), ctx.user_id)
            .await?;
        info!(user_id = %ctx.user_id, count, "Marked all notifications read");
        Ok(count)
    }

    /// Deletes a notification from the account's inbox.
    pub async fn delete(&self, ctx: &RequestContext, notification_id: Uuid) -> AppResult<()> {
        let deleted = self
            .notif_repo
            .delete(notification_id, ctx.recipient_model(), ctx.user_id)
            .await?;
        if !deleted {
            return Err(AppError::not_found("Notification not found"));
        }
        Ok(())
    }

    /// Clears the account's inbox.
    pub async fn delete_all(&self, ctx: &RequestContext) -> AppResult<u64> {
        let count = self
            .notif_repo
            .delete_all(ctx.recipient_model(), ctx.user_id)
            .await?;
        info!(user_id = %ctx.user_id, count, "Deleted notifications");
        Ok(count)
    }
}
