//! Overdue form sweep.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use dormhub_service::FormService;

use crate::executor::{JobExecutionError, JobHandler};

/// Tells admins, once per form, about requests still waiting past their
/// due date.
#[derive(Debug)]
pub struct OverdueFormsJob {
    forms: Arc<FormService>,
}

impl OverdueFormsJob {
    /// Job type name.
    pub const JOB_TYPE: &'static str = "overdue_forms";

    /// Create the job.
    pub fn new(forms: Arc<FormService>) -> Self {
        Self { forms }
    }
}

#[async_trait]
impl JobHandler for OverdueFormsJob {
    fn job_type(&self) -> &str {
        Self::JOB_TYPE
    }

    async fn execute(&self, now: DateTime<Utc>) -> Result<Value, JobExecutionError> {
        let flagged = self
            .forms
            .sweep_overdue(now)
            .await
            .map_err(|e| JobExecutionError::Transient(format!("Overdue form sweep failed: {e}")))?;

        Ok(serde_json::json!({
            "task": Self::JOB_TYPE,
            "forms_flagged": flagged,
        }))
    }
}
