//! Dashboard aggregation.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;

use dormhub_core::result::AppResult;
use dormhub_database::repositories::{
    AnalyticsRepository, BillRepository, BillTotals, FormRepository, LogRepository,
    OverviewCounts, RoomRepository,
};

/// Days covered by the late check-in figure.
const LATE_WINDOW_DAYS: i64 = 7;

/// Everything the admin dashboard shows.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    /// Headline counts.
    pub overview: OverviewCounts,
    /// Rooms per status label.
    pub rooms_by_status: BTreeMap<String, i64>,
    /// Forms per status label.
    pub forms_by_status: BTreeMap<String, i64>,
    /// Amount billed across all bills.
    pub billed: i64,
    /// Amount collected.
    pub collected: i64,
    /// Amount still owed.
    pub outstanding: i64,
    /// Bills currently overdue.
    pub overdue_bills: i64,
    /// Late check-in entries over the last week.
    pub late_check_ins: i64,
}

impl Dashboard {
    fn assemble(
        overview: OverviewCounts,
        rooms: Vec<(String, i64)>,
        forms: Vec<(String, i64)>,
        totals: BillTotals,
        late_check_ins: i64,
    ) -> Self {
        Self {
            overview,
            rooms_by_status: rooms.into_iter().collect(),
            forms_by_status: forms.into_iter().collect(),
            billed: totals.billed,
            collected: totals.collected,
            outstanding: (totals.billed - totals.collected).max(0),
            overdue_bills: totals.overdue_count,
            late_check_ins,
        }
    }
}

/// Read-only statistics over the other services' tables.
#[derive(Debug, Clone)]
pub struct AnalyticsService {
    analytics_repo: Arc<AnalyticsRepository>,
    room_repo: Arc<RoomRepository>,
    form_repo: Arc<FormRepository>,
    bill_repo: Arc<BillRepository>,
    log_repo: Arc<LogRepository>,
}

impl AnalyticsService {
    /// Creates a new analytics service.
    pub fn new(
        analytics_repo: Arc<AnalyticsRepository>,
        room_repo: Arc<RoomRepository>,
        form_repo: Arc<FormRepository>,
        bill_repo: Arc<BillRepository>,
        log_repo: Arc<LogRepository>,
    ) -> Self {
        Self {
            analytics_repo,
            room_repo,
            form_repo,
            bill_repo,
            log_repo,
        }
    }

    /// Gather the dashboard. The queries run concurrently.
    pub async fn dashboard(&self) -> AppResult<Dashboard> {
        let since = (Utc::now() - Duration::days(LATE_WINDOW_DAYS)).date_naive();
        let (overview, rooms, forms, totals, late) = tokio::try_join!(
            self.analytics_repo.overview(),
            self.room_repo.count_by_status(),
            self.form_repo.count_by_status(),
            self.bill_repo.totals(),
            self.log_repo.count_late_since(since),
        )?;

        Ok(Dashboard::assemble(
            overview,
            rooms.into_iter().map(|(s, n)| (s.to_string(), n)).collect(),
            forms.into_iter().map(|(s, n)| (s.to_string(), n)).collect(),
            totals,
            late,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_outstanding() {
        let dashboard = Dashboard::assemble(
            OverviewCounts::default(),
            vec![("Available".into(), 3), ("Occupied".into(), 1)],
            vec![("Submitted".into(), 2)],
            BillTotals {
                billed: 5000,
                collected: 3500,
                overdue_count: 1,
            },
            4,
        );
        assert_eq!(dashboard.outstanding, 1500);
        assert_eq!(dashboard.rooms_by_status["Available"], 3);
        assert_eq!(dashboard.forms_by_status.len(), 1);
        assert_eq!(dashboard.late_check_ins, 4);
    }
}
