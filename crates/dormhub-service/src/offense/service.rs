//! Recording and listing offenses.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use dormhub_core::AppError;
use dormhub_core::result::AppResult;
use dormhub_database::repositories::{OffenseRepository, StudentRepository};
use dormhub_entity::account::Role;
use dormhub_entity::offense::Offense;

use crate::context::RequestContext;
use crate::effects::{EffectExecutor, Outcome};
use crate::notification::rules;

/// An offense to record.
#[derive(Debug, Clone, Deserialize)]
pub struct OffenseRequest {
    /// Offending student.
    pub student_id: Uuid,
    /// Category, e.g. "noise".
    pub offense_type: String,
    /// What happened.
    pub description: String,
    /// Day it happened; defaults to today.
    pub occurred_on: Option<NaiveDate>,
}

/// Disciplinary records.
#[derive(Debug, Clone)]
pub struct OffenseService {
    offense_repo: Arc<OffenseRepository>,
    student_repo: Arc<StudentRepository>,
    effects: Arc<EffectExecutor>,
}

impl OffenseService {
    /// Creates a new offense service.
    pub fn new(
        offense_repo: Arc<OffenseRepository>,
        student_repo: Arc<StudentRepository>,
        effects: Arc<EffectExecutor>,
    ) -> Self {
        Self {
            offense_repo,
            student_repo,
            effects,
        }
    }

    /// Students see their own record; admins may filter by student.
    pub async fn list(&self, ctx: &RequestContext, student_id: Option<Uuid>) -> AppResult<Vec<Offense>> {
        match ctx.role {
            Role::Student => self.offense_repo.find_all(Some(ctx.user_id)).await,
            Role::Admin => self.offense_repo.find_all(student_id).await,
            Role::Staff => Err(AppError::authorization("Staff cannot view offenses")),
        }
    }

    /// Records an offense and notifies the student.
    pub async fn record(&self, ctx: &RequestContext, req: OffenseRequest) -> AppResult<Offense> {
        ctx.require_role(Role::Admin)?;
        let offense_type = req.offense_type.trim();
        let description = req.description.trim();
        if offense_type.is_empty() || description.is_empty() {
            return Err(AppError::validation("Offense type and description are required"));
        }
        if self.student_repo.find_by_id(req.student_id).await?.is_none() {
            return Err(AppError::not_found("Student not found"));
        }

        let now = Utc::now();
        let offense = Offense {
            id: Uuid::new_v4(),
            student_id: req.student_id,
            offense_type: offense_type.to_string(),
            description: description.to_string(),
            occurred_on: req.occurred_on.unwrap_or_else(|| now.date_naive()),
            recorded_by: ctx.user_id,
            created_at: now,
        };
        let offense = self.offense_repo.create(&offense).await?;
        info!(offense_id = %offense.id, student_id = %offense.student_id, "Offense recorded");

        let notice = rules::offense_recorded(&offense);
        Ok(self.effects.apply(Outcome::new(offense).notify(notice)).await)
    }

    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        ctx.require_role(Role::Admin)?;
        if !self.offense_repo.delete(id).await? {
            return Err(AppError::not_found("Offense not found"));
        }
        info!(offense_id = %id, admin_id = %ctx.user_id, "Offense deleted");
        Ok(())
    }
}
