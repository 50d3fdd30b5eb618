//! Application builder: wires router + middleware + state into an Axum app.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use dormhub_auth::{JwtDecoder, JwtEncoder, PasswordHasher, PasswordValidator};
use dormhub_core::config::AppConfig;
use dormhub_core::error::AppError;
use dormhub_core::traits::StorageProvider;
use dormhub_database::repositories::{
    AdminRepository, AnalyticsRepository, BillRepository, BuildingRepository,
    ConversationRepository, CurfewRepository, FormRepository, LogRepository, MessageRepository,
    NewsRepository, NotificationRepository, OffenseRepository, RoomRepository, StaffRepository,
    StudentRepository,
};
use dormhub_realtime::DeliveryRegistry;
use dormhub_service::{
    AccountAdminService, AnalyticsService, AttendanceService, AuthService, BillingService,
    BuildingService, CurfewStore, EffectExecutor, FormService, LogStore, MessagingService,
    NewsService, NotificationService, NotificationStore, OffenseService, ProfileService,
    RoomService, UploadService,
};
use dormhub_storage::{LocalStorageProvider, UploadPolicy};
use dormhub_worker::jobs::{OverdueBillsJob, OverdueFormsJob};
use dormhub_worker::{CronScheduler, JobExecutor};

use crate::middleware::compression::build_compression_layer;
use crate::middleware::cors::build_cors_layer;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    crate::error::hide_internal_errors(state.config.server.is_production());
    let cors = build_cors_layer(&state.config.server.cors);

    build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(build_compression_layer()),
    )
}

/// Constructs repositories, auth primitives and services over a pool.
pub async fn build_state(config: AppConfig, db_pool: PgPool) -> Result<AppState, AppError> {
    // ── Repositories ─────────────────────────────────────────────
    let admin_repo = Arc::new(AdminRepository::new(db_pool.clone()));
    let staff_repo = Arc::new(StaffRepository::new(db_pool.clone()));
    let student_repo = Arc::new(StudentRepository::new(db_pool.clone()));
    let building_repo = Arc::new(BuildingRepository::new(db_pool.clone()));
    let room_repo = Arc::new(RoomRepository::new(db_pool.clone()));
    let form_repo = Arc::new(FormRepository::new(db_pool.clone()));
    let bill_repo = Arc::new(BillRepository::new(db_pool.clone()));
    let curfew_repo = Arc::new(CurfewRepository::new(db_pool.clone()));
    let log_repo = Arc::new(LogRepository::new(db_pool.clone()));
    let conversation_repo = Arc::new(ConversationRepository::new(db_pool.clone()));
    let message_repo = Arc::new(MessageRepository::new(db_pool.clone()));
    let news_repo = Arc::new(NewsRepository::new(db_pool.clone()));
    let notification_repo = Arc::new(NotificationRepository::new(db_pool.clone()));
    let offense_repo = Arc::new(OffenseRepository::new(db_pool.clone()));
    let analytics_repo = Arc::new(AnalyticsRepository::new(db_pool.clone()));

    // ── Auth ─────────────────────────────────────────────────────
    let hasher = Arc::new(PasswordHasher::new());
    let validator = Arc::new(PasswordValidator::new(&config.auth));
    let jwt_encoder = Arc::new(JwtEncoder::new(&config.auth));
    let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));

    // ── Realtime and effects ─────────────────────────────────────
    let registry = Arc::new(DeliveryRegistry::new());
    let store: Arc<dyn NotificationStore> = notification_repo.clone();
    let effects = Arc::new(EffectExecutor::new(store, Arc::clone(&registry)));

    // ── Storage ──────────────────────────────────────────────────
    let storage: Arc<dyn StorageProvider> =
        Arc::new(LocalStorageProvider::from_config(&config.storage).await?);
    tracing::info!(upload_dir = %config.storage.upload_dir, "Upload storage ready");

    // ── Services ─────────────────────────────────────────────────
    let auth_service = Arc::new(AuthService::new(
        Arc::clone(&admin_repo),
        Arc::clone(&staff_repo),
        Arc::clone(&student_repo),
        Arc::clone(&hasher),
        jwt_encoder,
    ));
    let profile_service = Arc::new(ProfileService::new(
        Arc::clone(&admin_repo),
        Arc::clone(&staff_repo),
        Arc::clone(&student_repo),
        Arc::clone(&hasher),
        Arc::clone(&validator),
    ));
    let account_admin_service = Arc::new(AccountAdminService::new(
        Arc::clone(&admin_repo),
        Arc::clone(&staff_repo),
        Arc::clone(&student_repo),
        hasher,
        validator,
    ));
    let building_service = Arc::new(BuildingService::new(Arc::clone(&building_repo)));
    let room_service = Arc::new(RoomService::new(
        Arc::clone(&room_repo),
        building_repo,
        Arc::clone(&student_repo),
        Arc::clone(&effects),
    ));
    let form_service = Arc::new(FormService::new(
        Arc::clone(&form_repo),
        Arc::clone(&staff_repo),
        Arc::clone(&effects),
    ));
    let billing_service = Arc::new(BillingService::new(
        Arc::clone(&bill_repo),
        Arc::clone(&student_repo),
        Arc::clone(&effects),
    ));
    let curfews: Arc<dyn CurfewStore> = curfew_repo;
    let logs: Arc<dyn LogStore> = log_repo.clone();
    let attendance_service = Arc::new(AttendanceService::new(
        curfews,
        logs,
        Arc::clone(&effects),
        config.attendance.clone(),
    ));
    let offense_service = Arc::new(OffenseService::new(
        offense_repo,
        Arc::clone(&student_repo),
        Arc::clone(&effects),
    ));
    let messaging_service = Arc::new(MessagingService::new(
        conversation_repo,
        message_repo,
        admin_repo,
        Arc::clone(&student_repo),
        Arc::clone(&effects),
    ));
    let news_service = Arc::new(NewsService::new(news_repo, Arc::clone(&effects)));
    let notification_service = Arc::new(NotificationService::new(notification_repo));
    let analytics_service = Arc::new(AnalyticsService::new(
        analytics_repo,
        room_repo,
        form_repo,
        bill_repo,
        log_repo,
    ));
    let upload_service = Arc::new(UploadService::new(
        storage,
        UploadPolicy::from_config(&config.storage),
    ));

    Ok(AppState {
        config: Arc::new(config),
        db_pool,
        jwt_decoder,
        registry,
        auth_service,
        profile_service,
        account_admin_service,
        building_service,
        room_service,
        form_service,
        billing_service,
        attendance_service,
        offense_service,
        messaging_service,
        news_service,
        notification_service,
        analytics_service,
        upload_service,
    })
}

/// Builds the cron scheduler with the overdue sweeps registered.
pub async fn build_scheduler(state: &AppState) -> Result<CronScheduler, AppError> {
    let mut executor = JobExecutor::new();
    executor.register(Arc::new(OverdueBillsJob::new(Arc::clone(&state.billing_service))));
    executor.register(Arc::new(OverdueFormsJob::new(Arc::clone(&state.form_service))));

    let scheduler = CronScheduler::new(Arc::new(executor)).await?;
    scheduler.register_configured(&state.config.worker).await?;
    Ok(scheduler)
}

/// Runs the DormHub server with the given configuration and database pool.
pub async fn run_server(config: AppConfig, db_pool: PgPool) -> Result<(), AppError> {
    tracing::info!(environment = %config.server.environment, "Starting DormHub server...");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = build_state(config, db_pool.clone()).await?;

    let scheduler = if state.config.worker.enabled {
        let scheduler = build_scheduler(&state).await?;
        scheduler.start().await?;
        tracing::info!("Background scheduler started");
        Some(scheduler)
    } else {
        tracing::info!("Background scheduler disabled");
        None
    };

    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(%addr, "DormHub server listening");

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    let served = server.await;

    if let Some(scheduler) = scheduler {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!(error = %e, "Scheduler did not stop cleanly");
        }
    }

    if tokio::time::timeout(grace, db_pool.close()).await.is_err() {
        tracing::warn!(grace_seconds = grace.as_secs(), "Database pool close timed out");
    }

    served.map_err(|e| AppError::internal(format!("Server error: {e}")))?;
    tracing::info!("DormHub server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
