//! # dormhub-service
//!
//! Business logic service layer for DormHub. Each service orchestrates
//! repositories, storage and authentication to implement one area of the
//! dormitory workflow.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references. Actions persist first and
//! then hand their notifications and realtime events to the
//! [`EffectExecutor`], whose failures never reach the caller.

pub mod account;
pub mod analytics;
pub mod attendance;
pub mod billing;
pub mod context;
pub mod effects;
pub mod form;
pub mod housing;
pub mod messaging;
pub mod news;
pub mod notification;
pub mod offense;
pub mod upload;

pub use account::{AccountAdminService, AuthService, LoginResult, ProfileService};
pub use analytics::AnalyticsService;
pub use attendance::{AttendanceService, CurfewStore, LogStore};
pub use billing::BillingService;
pub use context::RequestContext;
pub use effects::{EffectExecutor, EffectReport, NotificationStore, Outcome, SideEffect};
pub use form::FormService;
pub use housing::{BuildingService, RoomService};
pub use messaging::MessagingService;
pub use news::NewsService;
pub use notification::NotificationService;
pub use offense::OffenseService;
pub use upload::UploadService;
