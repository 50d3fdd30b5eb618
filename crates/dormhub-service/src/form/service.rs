//! Form submission, review, assignment and staff progress.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use dormhub_core::AppError;
use dormhub_core::result::AppResult;
use dormhub_core::types::pagination::{PageRequest, PageResponse};
use dormhub_database::repositories::{FormFilter, FormRepository, StaffRepository};
use dormhub_entity::account::Role;
use dormhub_entity::form::{Feedback, Form, FormStatus, NewForm, Timing};

use super::workflow::{
    check_admin_transition, check_assignment, check_staff_transition, transition_outcome,
};
use crate::context::RequestContext;
use crate::effects::{EffectExecutor, Outcome};
use crate::notification::rules;

/// A student's review of completed work.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewRequest {
    /// Rating from 1 to 5.
    pub rating: u8,
    /// Optional comment.
    pub comment: Option<String>,
}

/// Drives service request forms through their lifecycle.
#[derive(Debug, Clone)]
pub struct FormService {
    /// Form repository.
    form_repo: Arc<FormRepository>,
    /// Staff repository, for assignment checks.
    staff_repo: Arc<StaffRepository>,
    /// Side-effect runner.
    effects: Arc<EffectExecutor>,
}

impl FormService {
    /// Creates a new form service.
    pub fn new(
        form_repo: Arc<FormRepository>,
        staff_repo: Arc<StaffRepository>,
        effects: Arc<EffectExecutor>,
    ) -> Self {
        Self {
            form_repo,
            staff_repo,
            effects,
        }
    }

    async fn load(&self, id: Uuid) -> AppResult<Form> {
        self.form_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Form not found"))
    }

    /// Gets a form the current account may see: students see their own,
    /// staff see forms assigned to them, admins see everything.
    pub async fn get(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Form> {
        let form = self.load(id).await?;
        let visible = match ctx.role {
            Role::Admin => true,
            Role::Student => form.student_id == ctx.user_id,
            Role::Staff => form.assigned_staff_id == Some(ctx.user_id),
        };
        if !visible {
            return Err(AppError::not_found("Form not found"));
        }
        Ok(form)
    }

    /// Lists forms. Students and staff only ever see their own.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        mut filter: FormFilter,
        page: PageRequest,
    ) -> AppResult<PageResponse<Form>> {
        match ctx.role {
            Role::Student => filter.student_id = Some(ctx.user_id),
            Role::Staff => filter.staff_id = Some(ctx.user_id),
            Role::Admin => {}
        }
        self.form_repo.find_all(&filter, &page.normalized()).await
    }

    /// Submits a new form as the current student.
    pub async fn submit(&self, ctx: &RequestContext, input: NewForm) -> AppResult<Form> {
        ctx.require_role(Role::Student)?;
        let form = Form::submit(ctx.user_id, input, ctx.actor(), Utc::now())?;
        let form = self.form_repo.create(&form).await?;

        info!(
            form_id = %form.id,
            student_id = %ctx.user_id,
            priority = form.priority.as_str(),
            due_date = %form.due_date,
            "Form submitted"
        );
        Ok(self.effects.apply(transition_outcome(form, None, None)).await)
    }

    /// Admin status change along the transition table.
    pub async fn update_status(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        target: FormStatus,
        notes: Option<String>,
    ) -> AppResult<Form> {
        ctx.require_role(Role::Admin)?;
        let mut form = self.load(id).await?;
        check_admin_transition(&form, target)?;

        let previous = form.status;
        form.push_status(target, ctx.actor(), notes.clone(), Utc::now());
        let form = self.form_repo.update(&form).await?;

        info!(form_id = %id, from = %previous, to = %target, admin_id = %ctx.user_id, "Form status changed");
        Ok(self
            .effects
            .apply(transition_outcome(form, Some(previous), notes.as_deref()))
            .await)
    }

    /// Assigns a staff member to a form.
    pub async fn assign(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        staff_id: Uuid,
        notes: Option<String>,
    ) -> AppResult<Form> {
        ctx.require_role(Role::Admin)?;
        let mut form = self.load(id).await?;
        let staff = self
            .staff_repo
            .find_by_id(staff_id)
            .await?
            .ok_or_else(|| AppError::not_found("Staff member not found"))?;
        check_assignment(&form, &staff)?;

        let previous = form.status;
        form.assigned_staff_id = Some(staff.id);
        let notes = notes.or_else(|| Some(format!("Assigned to {}", staff.name)));
        form.push_status(FormStatus::Assigned, ctx.actor(), notes, Utc::now());
        let form = self.form_repo.update(&form).await?;

        info!(form_id = %id, staff_id = %staff.id, "Form assigned");
        Ok(self
            .effects
            .apply(transition_outcome(form, Some(previous), None))
            .await)
    }

    /// The assigned staff member starts work.
    pub async fn start(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Form> {
        ctx.require_role(Role::Staff)?;
        let mut form = self.load(id).await?;
        check_staff_transition(&form, ctx.user_id, FormStatus::InProgress)?;

        let now = Utc::now();
        let previous = form.status;
        form.actual_timing.start = Some(now);
        form.push_status(FormStatus::InProgress, ctx.actor(), None, now);
        let form = self.form_repo.update(&form).await?;

        info!(form_id = %id, staff_id = %ctx.user_id, "Work started");
        Ok(self
            .effects
            .apply(transition_outcome(form, Some(previous), None))
            .await)
    }

    /// The assigned staff member finishes work.
    pub async fn complete(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        notes: Option<String>,
    ) -> AppResult<Form> {
        ctx.require_role(Role::Staff)?;
        let mut form = self.load(id).await?;
        check_staff_transition(&form, ctx.user_id, FormStatus::Completed)?;

        let now = Utc::now();
        let previous = form.status;
        form.actual_timing.end = Some(now);
        form.push_status(FormStatus::Completed, ctx.actor(), notes.clone(), now);
        let form = self.form_repo.update(&form).await?;

        info!(form_id = %id, staff_id = %ctx.user_id, "Work completed");
        Ok(self
            .effects
            .apply(transition_outcome(form, Some(previous), notes.as_deref()))
            .await)
    }

    /// The submitting student reviews completed work, once.
    pub async fn review(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        req: ReviewRequest,
    ) -> AppResult<Form> {
        ctx.require_role(Role::Student)?;
        let mut form = self.get(ctx, id).await?;
        if form.status != FormStatus::Completed {
            return Err(AppError::validation("Only completed forms can be reviewed"));
        }
        if form.feedback.is_some() {
            return Err(AppError::conflict("This form has already been reviewed"));
        }
        if !(1..=5).contains(&req.rating) {
            return Err(AppError::validation("Rating must be between 1 and 5"));
        }

        let now = Utc::now();
        form.feedback = Some(Feedback {
            rating: req.rating,
            comment: req.comment.filter(|c| !c.trim().is_empty()),
            submitted_at: now,
        });
        form.updated_at = now;
        let form = self.form_repo.update(&form).await?;
        info!(form_id = %id, rating = req.rating, "Form reviewed");
        Ok(form)
    }

    /// Replaces a form with a resubmitted copy at a new preferred time.
    ///
    /// The new form is inserted and the old one deleted in one
    /// transaction.
    pub async fn reschedule(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        preferred_timing: Timing,
    ) -> AppResult<Form> {
        ctx.require_role(Role::Student)?;
        let original = self.get(ctx, id).await?;
        if !original.status.can_reschedule() {
            return Err(AppError::validation(format!(
                "A {} form cannot be rescheduled",
                original.status
            )));
        }

        let replacement = Form::rescheduled_from(&original, preferred_timing, ctx.actor(), Utc::now())?;
        let form = self.form_repo.replace(original.id, &replacement).await?;

        info!(old_form_id = %original.id, form_id = %form.id, "Form rescheduled");
        Ok(self
            .effects
            .apply(transition_outcome(form, Some(original.status), None))
            .await)
    }

    /// Appends stored attachment paths to an open form.
    pub async fn add_attachments(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        paths: Vec<String>,
    ) -> AppResult<Form> {
        ctx.require_role(Role::Student)?;
        let mut form = self.get(ctx, id).await?;
        if form.status.is_terminal() {
            return Err(AppError::validation(format!(
                "Cannot attach files to a {} form",
                form.status
            )));
        }
        form.attachments.extend(paths);
        form.updated_at = Utc::now();
        self.form_repo.update(&form).await
    }

    /// Sends one overdue notice per form that waited past its due date.
    /// Returns how many forms were flagged.
    pub async fn sweep_overdue(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let forms = self.form_repo.find_overdue_unnotified(now).await?;
        let mut flagged = 0;
        for form in forms {
            self.form_repo.mark_overdue_notified(form.id, now).await?;
            let notice = rules::form_overdue(&form);
            self.effects.apply(Outcome::new(()).notify(notice)).await;
            flagged += 1;
        }
        if flagged > 0 {
            info!(count = flagged, "Overdue forms flagged");
        }
        Ok(flagged)
    }
}
