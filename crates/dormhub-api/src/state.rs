//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use sqlx::PgPool;

use dormhub_auth::JwtDecoder;
use dormhub_core::config::AppConfig;
use dormhub_realtime::DeliveryRegistry;
use dormhub_service::{
    AccountAdminService, AnalyticsService, AttendanceService, AuthService, BillingService,
    BuildingService, FormService, MessagingService, NewsService, NotificationService,
    OffenseService, ProfileService, RoomService, UploadService,
};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// PostgreSQL connection pool
    pub db_pool: PgPool,
    /// Session token decoder
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Live connection registry
    pub registry: Arc<DeliveryRegistry>,

    // ── Accounts ─────────────────────────────────────────────
    /// Sign-in
    pub auth_service: Arc<AuthService>,
    /// Self-service profile
    pub profile_service: Arc<ProfileService>,
    /// Admin account management
    pub account_admin_service: Arc<AccountAdminService>,

    // ── Housing ──────────────────────────────────────────────
    /// Buildings
    pub building_service: Arc<BuildingService>,
    /// Rooms and occupants
    pub room_service: Arc<RoomService>,

    // ── Workflow ─────────────────────────────────────────────
    /// Service request forms
    pub form_service: Arc<FormService>,
    /// Bills and payments
    pub billing_service: Arc<BillingService>,
    /// Curfew and check-in logs
    pub attendance_service: Arc<AttendanceService>,
    /// Offense records
    pub offense_service: Arc<OffenseService>,

    // ── Communication ────────────────────────────────────────
    /// Direct messages
    pub messaging_service: Arc<MessagingService>,
    /// News posts
    pub news_service: Arc<NewsService>,
    /// Notification inbox
    pub notification_service: Arc<NotificationService>,

    // ── Other ────────────────────────────────────────────────
    /// Dashboard counts
    pub analytics_service: Arc<AnalyticsService>,
    /// Upload storage
    pub upload_service: Arc<UploadService>,
}
