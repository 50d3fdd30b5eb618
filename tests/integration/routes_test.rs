//! Routing, role gating and request validation. None of these reach the
//! database.

use axum::http::StatusCode;
use uuid::Uuid;

use dormhub_entity::account::Role;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
    assert!(response.body["data"]["realtime"].is_object());
}

#[tokio::test]
async fn test_readiness_reports_unreachable_database() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/health/ready", None, None).await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["success"], false);
    assert_eq!(response.body["data"]["database"], "unreachable");
    assert_eq!(response.body["data"]["storage"], "available");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = TestApp::new().await;

    for path in ["/api/students/forms", "/api/staff/forms", "/api/admin/students"] {
        let response = app.request("GET", path, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(response.body["success"], false);
        assert_eq!(response.body["error"], "AUTHENTICATION");
    }
}

#[tokio::test]
async fn test_garbage_token_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .request("GET", "/api/admin/students", None, Some("not.a.jwt"))
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_wrong_role_is_forbidden() {
    let app = TestApp::new().await;
    let (_, staff_token) = app.token_for(Role::Staff);
    let (_, student_token) = app.token_for(Role::Student);

    let response = app
        .request("GET", "/api/admin/students", None, Some(&staff_token))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(response.body["error"], "AUTHORIZATION");

    let response = app
        .request("GET", "/api/staff/forms", None, Some(&student_token))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_routes_skip_the_gate() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/students/login",
            Some(serde_json::json!({ "email": "not-an-email", "password": "x" })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION");
}

#[tokio::test]
async fn test_check_in_for_another_student_is_forbidden() {
    let app = TestApp::new().await;
    let (_, token) = app.token_for(Role::Student);

    let path = format!("/api/students/{}/check-in", Uuid::new_v4());
    let response = app.request("POST", &path, None, Some(&token)).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_review_rating_is_validated() {
    let app = TestApp::new().await;
    let (_, token) = app.token_for(Role::Student);

    let path = format!("/api/students/forms/{}/review", Uuid::new_v4());
    let response = app
        .request(
            "POST",
            &path,
            Some(serde_json::json!({ "rating": 9 })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_assign_via_status_needs_staff() {
    let app = TestApp::new().await;
    let (_, token) = app.token_for(Role::Admin);

    let path = format!("/api/admin/forms/{}/status", Uuid::new_v4());
    let response = app
        .request(
            "PUT",
            &path,
            Some(serde_json::json!({ "status": "Assigned" })),
            Some(&token),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(
        response.body["message"]
            .as_str()
            .unwrap_or_default()
            .contains("assigned_staff_id")
    );
}

#[tokio::test]
async fn test_unknown_upload_category_is_not_found() {
    let app = TestApp::new().await;
    let (_, token) = app.token_for(Role::Student);

    let response = app
        .request("GET", "/uploads/avatars/a.png", None, Some(&token))
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_path_traversal_is_rejected() {
    let app = TestApp::new().await;
    let (_, token) = app.token_for(Role::Student);

    let response = app
        .request("GET", "/uploads/forms/..%2Fsecret.pdf", None, Some(&token))
        .await;

    assert!(
        response.status == StatusCode::BAD_REQUEST || response.status == StatusCode::NOT_FOUND,
        "got {}",
        response.status
    );
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/nowhere", None, None).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
