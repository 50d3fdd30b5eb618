//! Overdue bill sweep.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use dormhub_service::BillingService;

use crate::executor::{JobExecutionError, JobHandler};

/// Flags pending bills past their due date and tells each student.
#[derive(Debug)]
pub struct OverdueBillsJob {
    billing: Arc<BillingService>,
}

impl OverdueBillsJob {
    /// Job type name.
    pub const JOB_TYPE: &'static str = "overdue_bills";

    /// Create the job.
    pub fn new(billing: Arc<BillingService>) -> Self {
        Self { billing }
    }
}

#[async_trait]
impl JobHandler for OverdueBillsJob {
    fn job_type(&self) -> &str {
        Self::JOB_TYPE
    }

    async fn execute(&self, now: DateTime<Utc>) -> Result<Value, JobExecutionError> {
        let flagged = self
            .billing
            .sweep_overdue(now)
            .await
            .map_err(|e| JobExecutionError::Transient(format!("Overdue bill sweep failed: {e}")))?;

        Ok(serde_json::json!({
            "task": Self::JOB_TYPE,
            "bills_flagged": flagged,
        }))
    }
}
