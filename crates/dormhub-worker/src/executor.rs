//! Job executor: dispatches jobs to registered handlers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing;

use dormhub_core::error::AppError;

/// Trait for job handler implementations
#[async_trait]
pub trait JobHandler: Send + Sync + std::fmt::Debug {
    /// Get the job type this handler processes
    fn job_type(&self) -> &str;

    /// Run the job as of `now` and return a summary
    async fn execute(&self, now: DateTime<Utc>) -> Result<Value, JobExecutionError>;
}

/// Error from job execution
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// Permanent failure; retrying on the next tick will not help
    #[error("Permanent job failure: {0}")]
    Permanent(String),

    /// Transient failure; the next tick may succeed
    #[error("Transient job failure: {0}")]
    Transient(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

/// Dispatches jobs to the appropriate handler based on job type
#[derive(Debug, Default)]
pub struct JobExecutor {
    /// Registered job handlers by type
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobExecutor {
    /// Create a new job executor
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job handler
    pub fn register(&mut self, handler: Arc<dyn JobHandler>) {
        let job_type = handler.job_type().to_string();
        tracing::info!(job_type = %job_type, "Registered job handler");
        self.handlers.insert(job_type, handler);
    }

    /// Execute a job by dispatching to the correct handler
    pub async fn execute(&self, job_type: &str, now: DateTime<Utc>) -> Result<Value, JobExecutionError> {
        let handler = self.handlers.get(job_type).ok_or_else(|| {
            JobExecutionError::Permanent(format!("No handler registered for job type '{job_type}'"))
        })?;

        tracing::debug!(job_type, "Executing job");
        let started = std::time::Instant::now();
        let result = handler.execute(now).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(summary) => tracing::info!(job_type, elapsed_ms, %summary, "Job completed"),
            Err(e) => tracing::error!(job_type, elapsed_ms, error = %e, "Job failed"),
        }
        result
    }

    /// Check if a handler is registered for a job type
    pub fn has_handler(&self, job_type: &str) -> bool {
        self.handlers.contains_key(job_type)
    }

    /// Get the list of registered job types
    pub fn registered_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.handlers.keys().cloned().collect();
        types.sort();
        types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Counting {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl JobHandler for Counting {
        fn job_type(&self) -> &str {
            "counting"
        }

        async fn execute(&self, _now: DateTime<Utc>) -> Result<Value, JobExecutionError> {
            let n = self.runs.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(serde_json::json!({ "runs": n }))
        }
    }

    #[tokio::test]
    async fn test_dispatch_to_registered_handler() {
        let handler = Arc::new(Counting::default());
        let mut executor = JobExecutor::new();
        executor.register(handler.clone());

        assert!(executor.has_handler("counting"));
        let summary = executor.execute("counting", Utc::now()).await.unwrap();
        assert_eq!(summary["runs"], 1);
        assert_eq!(handler.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_job_is_permanent_failure() {
        let executor = JobExecutor::new();
        let err = executor.execute("missing", Utc::now()).await.unwrap_err();
        assert!(matches!(err, JobExecutionError::Permanent(_)));
        assert!(executor.registered_types().is_empty());
    }
}
