//! Repository implementations for all DormHub entities.

pub mod account;
pub mod analytics;
pub mod attendance;
pub mod bill;
pub mod building;
pub mod form;
pub mod messaging;
pub mod news;
pub mod notification;
pub mod offense;
pub mod room;

pub use account::{AdminRepository, StaffFilter, StaffRepository, StudentRepository};
pub use analytics::{AnalyticsRepository, OverviewCounts};
pub use attendance::{CurfewRepository, LogRepository};
pub use bill::{BillRepository, BillTotals};
pub use building::BuildingRepository;
pub use form::{FormFilter, FormRepository};
pub use messaging::{ConversationRepository, MessageRepository};
pub use news::NewsRepository;
pub use notification::NotificationRepository;
pub use offense::OffenseRepository;
pub use room::{Placement, RoomRepository};

use dormhub_core::error::{AppError, ErrorKind};

/// Map a sqlx error into an [`AppError`], turning unique-constraint
/// violations into a conflict the caller can report.
pub(crate) fn db_error(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        if let sqlx::Error::Database(ref db) = e {
            if db.is_unique_violation() {
                return AppError::conflict(format!("{message}: duplicate value"));
            }
        }
        AppError::with_source(ErrorKind::Database, message, e)
    }
}
