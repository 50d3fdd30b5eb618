//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Scheduled job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the scheduler is started with the server.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression (with seconds) for the overdue bill sweep.
    #[serde(default = "default_bill_cron")]
    pub overdue_bills_cron: String,
    /// Cron expression (with seconds) for the overdue form sweep.
    #[serde(default = "default_form_cron")]
    pub overdue_forms_cron: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            overdue_bills_cron: default_bill_cron(),
            overdue_forms_cron: default_form_cron(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_bill_cron() -> String {
    "0 0 1 * * *".to_string()
}

fn default_form_cron() -> String {
    "0 */15 * * * *".to_string()
}
