//! Route definitions for the DormHub HTTP API.
//!
//! Routes are grouped per role under `/api/students`, `/api/staff` and
//! `/api/admin`. Everything in a group except its login route sits behind
//! that group's role gate.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state
        .config
        .server
        .body_limit_bytes
        .max(state.config.storage.max_upload_size_bytes as usize);

    let api_routes = Router::new()
        .nest("/students", student_routes(&state))
        .nest("/staff", staff_routes(&state))
        .nest("/admin", admin_routes(&state));

    Router::new()
        .nest("/api", api_routes)
        .route(
            "/uploads/{category}/{filename}",
            get(handlers::uploads::download),
        )
        .route("/ws", get(handlers::ws::ws_handler))
        .merge(health_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Notification inbox, identical for every role.
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            get(handlers::notification::list_notifications)
                .delete(handlers::notification::delete_all),
        )
        .route(
            "/notifications/unread-count",
            get(handlers::notification::unread_count),
        )
        .route(
            "/notifications/read-all",
            put(handlers::notification::mark_all_read),
        )
        .route(
            "/notifications/{id}/read",
            put(handlers::notification::mark_read),
        )
        .route(
            "/notifications/{id}",
            delete(handlers::notification::delete_notification),
        )
}

/// Student/admin conversations.
fn conversation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/conversations",
            get(handlers::messaging::list_conversations).post(handlers::messaging::send_message),
        )
        .route(
            "/conversations/unread-count",
            get(handlers::messaging::unread_messages),
        )
        .route(
            "/conversations/{id}/messages",
            get(handlers::messaging::fetch_messages),
        )
}

/// `/api/students`
fn student_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(handlers::auth::logout))
        .route(
            "/profile",
            get(handlers::auth::get_profile).put(handlers::auth::update_profile),
        )
        .route("/password", put(handlers::auth::change_password))
        // Forms
        .route(
            "/forms",
            get(handlers::forms::list_forms).post(handlers::forms::submit_form),
        )
        .route("/forms/{id}", get(handlers::forms::get_form))
        .route("/forms/{id}/review", post(handlers::forms::review_form))
        .route(
            "/forms/{id}/reschedule",
            post(handlers::forms::reschedule_form),
        )
        .route(
            "/forms/{id}/attachments",
            post(handlers::forms::add_attachments),
        )
        // Bills
        .route("/bills", get(handlers::bills::list_bills))
        .route("/bills/{id}", get(handlers::bills::get_bill))
        .route("/bills/{id}/pay", post(handlers::bills::pay_bill))
        .route("/bills/{id}/receipt", post(handlers::bills::upload_receipt))
        // Attendance
        .route("/{id}/check-in", post(handlers::attendance::check_in))
        .route("/{id}/check-out", post(handlers::attendance::check_out))
        .route("/logs", get(handlers::attendance::list_logs))
        .route("/curfew", get(handlers::attendance::get_curfew))
        // Board, record and room
        .route("/news", get(handlers::news::list_news))
        .route("/news/{id}", get(handlers::news::get_news))
        .route("/offenses", get(handlers::offenses::list_offenses))
        .route("/room", get(handlers::housing::my_room))
        .merge(notification_routes())
        .merge(conversation_routes())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_student,
        ));

    Router::new()
        .route("/login", post(handlers::auth::student_login))
        .merge(protected)
}

/// `/api/staff`
fn staff_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(handlers::auth::logout))
        .route(
            "/profile",
            get(handlers::auth::get_profile).put(handlers::auth::update_profile),
        )
        .route("/password", put(handlers::auth::change_password))
        .route("/availability", put(handlers::auth::set_availability))
        .route("/forms", get(handlers::forms::list_forms))
        .route("/forms/{id}", get(handlers::forms::get_form))
        .route("/forms/{id}/start", put(handlers::forms::start_form))
        .route("/forms/{id}/complete", put(handlers::forms::complete_form))
        .route("/news", get(handlers::news::list_news))
        .merge(notification_routes())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_staff,
        ));

    Router::new()
        .route("/login", post(handlers::auth::staff_login))
        .merge(protected)
}

/// `/api/admin`
fn admin_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(handlers::auth::logout))
        .route("/profile", get(handlers::auth::get_profile))
        // Accounts
        .route(
            "/students",
            get(handlers::accounts::list_students).post(handlers::accounts::create_student),
        )
        .route(
            "/students/{id}",
            get(handlers::accounts::get_student)
                .put(handlers::accounts::update_student)
                .delete(handlers::accounts::delete_student),
        )
        .route(
            "/staff",
            get(handlers::accounts::list_staff).post(handlers::accounts::create_staff),
        )
        .route(
            "/staff/{id}",
            get(handlers::accounts::get_staff)
                .put(handlers::accounts::update_staff)
                .delete(handlers::accounts::delete_staff),
        )
        // Housing
        .route(
            "/buildings",
            get(handlers::housing::list_buildings).post(handlers::housing::create_building),
        )
        .route(
            "/buildings/{id}",
            get(handlers::housing::get_building)
                .put(handlers::housing::update_building)
                .delete(handlers::housing::delete_building),
        )
        .route(
            "/buildings/{id}/rooms",
            get(handlers::housing::list_building_rooms),
        )
        .route(
            "/rooms",
            get(handlers::housing::list_rooms).post(handlers::housing::create_room),
        )
        .route(
            "/rooms/{id}",
            get(handlers::housing::get_room)
                .put(handlers::housing::update_room)
                .delete(handlers::housing::delete_room),
        )
        .route(
            "/rooms/{id}/occupants",
            post(handlers::housing::add_occupant),
        )
        .route(
            "/rooms/{id}/occupants/{student_id}",
            delete(handlers::housing::remove_occupant),
        )
        // Forms
        .route("/forms", get(handlers::forms::list_forms))
        .route("/forms/{id}", get(handlers::forms::get_form))
        .route(
            "/forms/{id}/status",
            put(handlers::forms::update_form_status),
        )
        .route("/forms/{id}/assign", put(handlers::forms::assign_form))
        // Bills
        .route(
            "/bills",
            get(handlers::bills::list_bills).post(handlers::bills::create_bill),
        )
        .route(
            "/bills/{id}",
            get(handlers::bills::get_bill).delete(handlers::bills::delete_bill),
        )
        .route(
            "/bills/{id}/status",
            put(handlers::bills::update_bill_status),
        )
        .route("/bills/{id}/payments", post(handlers::bills::pay_bill))
        .route("/bills/{id}/return", post(handlers::bills::return_bill))
        // Attendance
        .route(
            "/curfew",
            get(handlers::attendance::get_curfew).post(handlers::attendance::set_curfew),
        )
        .route("/logs", get(handlers::attendance::list_logs))
        .route(
            "/logs/{id}/entries/{index}/excuse",
            put(handlers::attendance::excuse_entry),
        )
        // News
        .route(
            "/news",
            get(handlers::news::list_news).post(handlers::news::publish_news),
        )
        .route(
            "/news/{id}",
            get(handlers::news::get_news)
                .put(handlers::news::update_news)
                .delete(handlers::news::delete_news),
        )
        .route("/news/{id}/image", post(handlers::news::set_news_image))
        // Offenses
        .route(
            "/offenses",
            get(handlers::offenses::list_offenses).post(handlers::offenses::record_offense),
        )
        .route(
            "/offenses/{id}",
            delete(handlers::offenses::delete_offense),
        )
        .route("/analytics", get(handlers::analytics::dashboard))
        .merge(notification_routes())
        .merge(conversation_routes())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ));

    Router::new()
        .route("/login", post(handlers::auth::admin_login))
        .merge(protected)
}

/// Health check endpoints (no auth required)
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/health/ready", get(handlers::health::ready))
}
